pub mod display;
pub mod geometry;
pub mod stroke;
pub mod surface;

pub use display::{DisplayImage, ImageKind};
pub use geometry::{BoundingBox, Point};
pub use stroke::Stroke;
pub use surface::{
    AnnotationSurface, SessionCallbacks, SurfaceAction, SurfaceEvent, SurfaceOptions,
};
