//! Circle math in a photo, crop the inked region, and turn it into LaTeX.

pub mod annotate;
pub mod capture;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod loader;
pub mod paint_window;
pub mod pipeline;
pub mod pricing;
pub mod recognize;
pub mod renderer;

pub use annotate::{AnnotationSurface, BoundingBox, Point, SessionCallbacks, Stroke};
pub use capture::{EncodedImage, SnapshotFormat};
pub use error::{RecognizeError, SurfaceError};
