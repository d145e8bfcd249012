use log::{debug, error, info, warn};
use tiny_skia::Pixmap;

use super::display::{DisplayImage, ImageKind};
use super::geometry::{BoundingBox, Point};
use super::stroke::Stroke;
use crate::capture::{encode_region, EncodedImage, SnapshotFormat};
use crate::error::SurfaceError;
use crate::renderer::{InkStyle, Renderer};

/// The two ways a session can end. Exactly one of them runs, once.
pub struct SessionCallbacks {
    on_confirm: Box<dyn FnOnce(EncodedImage)>,
    on_cancel: Box<dyn FnOnce()>,
}

impl SessionCallbacks {
    pub fn new(
        on_confirm: impl FnOnce(EncodedImage) + 'static,
        on_cancel: impl FnOnce() + 'static,
    ) -> Self {
        Self {
            on_confirm: Box::new(on_confirm),
            on_cancel: Box::new(on_cancel),
        }
    }
}

/// Messages delivered to the surface on the UI thread.
pub enum SurfaceEvent {
    /// An image load finished. `session` is the generation it was requested for.
    ImageReady {
        session: u64,
        kind: ImageKind,
        image: Pixmap,
    },
    PointerDown(Point),
    PointerMove(Point),
    PointerUp,
    Confirm,
    Cancel,
}

// SurfaceAction: what the host window should do after an event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceAction {
    None,
    Redraw,
    Closed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceOptions {
    pub ink: InkStyle,
    pub format: SnapshotFormat,
    pub jpeg_quality: u8,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            ink: InkStyle::default(),
            format: SnapshotFormat::Png,
            jpeg_quality: 90,
        }
    }
}

/// Freehand "circle the math" layer over a photo.
///
/// Collects strokes, grows a bounding box as ink arrives and, on confirm, hands
/// back an encoded crop of just the inked region.
pub struct AnnotationSurface {
    width: u32,
    height: u32,
    renderer: Renderer,
    options: SurfaceOptions,
    image: DisplayImage,
    strokes: Vec<Stroke>,
    drawing: bool,
    bounds: BoundingBox,
    callbacks: Option<SessionCallbacks>,
    session: u64,
}

impl AnnotationSurface {
    pub fn new(
        width: u32,
        height: u32,
        options: SurfaceOptions,
        callbacks: SessionCallbacks,
    ) -> anyhow::Result<Self> {
        let renderer = Renderer::new(width, height, options.ink)?;
        Ok(Self {
            width,
            height,
            renderer,
            options,
            image: DisplayImage::Pending,
            strokes: Vec::new(),
            drawing: false,
            bounds: BoundingBox::EMPTY,
            callbacks: Some(callbacks),
            session: 0,
        })
    }

    /// Starts a fresh session for a new photo. Loads still in flight for the
    /// previous session are dropped when they arrive.
    pub fn restart(&mut self, callbacks: SessionCallbacks) -> u64 {
        self.session += 1;
        self.image = DisplayImage::Pending;
        self.strokes.clear();
        self.drawing = false;
        self.bounds = BoundingBox::EMPTY;
        self.callbacks = Some(callbacks);
        debug!("annotation session {} started", self.session);
        self.session
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    pub fn is_open(&self) -> bool {
        self.callbacks.is_some()
    }

    pub fn is_image_pending(&self) -> bool {
        self.image.is_pending()
    }

    pub fn has_active_stroke(&self) -> bool {
        self.drawing
    }

    pub fn displayed_kind(&self) -> Option<ImageKind> {
        self.image.kind()
    }

    /// Adopts a finished image load. Returns true if the displayed image changed.
    pub fn image_ready(&mut self, kind: ImageKind, image: Pixmap) -> bool {
        if !self.is_open() {
            return false;
        }
        let adopted = self.image.offer(kind, image);
        if adopted {
            debug!("displaying {kind:?} image");
        } else {
            debug!("ignoring {kind:?} image, full resolution already shown");
        }
        adopted
    }

    pub fn begin_stroke(&mut self, p: Point) -> Result<(), SurfaceError> {
        if !self.is_open() {
            return Err(SurfaceError::SessionClosed);
        }
        if self.image.is_pending() {
            return Err(SurfaceError::ImagePending);
        }
        self.strokes.push(Stroke::starting_at(p));
        self.drawing = true;
        Ok(())
    }

    pub fn extend_stroke(&mut self, p: Point) -> Result<(), SurfaceError> {
        if !self.is_open() {
            return Err(SurfaceError::SessionClosed);
        }
        if !self.drawing {
            return Err(SurfaceError::NoActiveStroke);
        }
        let stroke = self
            .strokes
            .last_mut()
            .ok_or(SurfaceError::NoActiveStroke)?;
        if let Some(prev) = stroke.last_point() {
            self.bounds.include(prev);
        }
        self.bounds.include(p);
        stroke.push(p);
        Ok(())
    }

    pub fn end_stroke(&mut self) {
        self.drawing = false;
    }

    /// Returns `Ok(true)` once the confirm callback has fired. With no ink the
    /// session stays open and `Ok(false)` comes back.
    pub fn confirm(&mut self) -> Result<bool, SurfaceError> {
        if !self.is_open() {
            return Err(SurfaceError::SessionClosed);
        }
        let Some(rect) = self.bounds.pixel_rect(self.width, self.height) else {
            warn!("confirm without ink inside the surface; nothing to send");
            return Ok(false);
        };
        self.end_stroke();
        self.renderer.compose(self.image.current(), &self.strokes);
        let encoded = encode_region(
            &self.renderer.pixmap,
            rect,
            self.options.format,
            self.options.jpeg_quality,
        )
        .map_err(|e| SurfaceError::Snapshot(e.to_string()))?;
        let Some(callbacks) = self.callbacks.take() else {
            return Err(SurfaceError::SessionClosed);
        };
        info!(
            "annotation confirmed: {} strokes, crop {}x{} at ({}, {})",
            self.strokes.len(),
            encoded.width,
            encoded.height,
            rect.0,
            rect.1
        );
        self.strokes.clear();
        self.bounds = BoundingBox::EMPTY;
        (callbacks.on_confirm)(encoded);
        Ok(true)
    }

    pub fn cancel(&mut self) -> Result<(), SurfaceError> {
        let callbacks = self.callbacks.take().ok_or(SurfaceError::SessionClosed)?;
        self.strokes.clear();
        self.drawing = false;
        self.bounds = BoundingBox::EMPTY;
        info!("annotation canceled");
        (callbacks.on_cancel)();
        Ok(())
    }

    /// Renders the current frame for presentation.
    pub fn compose(&mut self) -> &Renderer {
        self.renderer.compose(self.image.current(), &self.strokes);
        &self.renderer
    }

    pub fn handle_event(&mut self, event: SurfaceEvent) -> SurfaceAction {
        match event {
            SurfaceEvent::ImageReady {
                session,
                kind,
                image,
            } => {
                if session != self.session {
                    debug!("dropping {kind:?} image from stale session {session}");
                    return SurfaceAction::None;
                }
                if self.image_ready(kind, image) {
                    SurfaceAction::Redraw
                } else {
                    SurfaceAction::None
                }
            }
            SurfaceEvent::PointerDown(p) => match self.begin_stroke(p) {
                Ok(()) => SurfaceAction::Redraw,
                Err(SurfaceError::ImagePending) => {
                    debug!("pointer down before image loaded; ignored");
                    SurfaceAction::None
                }
                Err(e) => {
                    debug!("pointer down ignored: {e}");
                    SurfaceAction::None
                }
            },
            SurfaceEvent::PointerMove(p) => match self.extend_stroke(p) {
                Ok(()) => SurfaceAction::Redraw,
                Err(SurfaceError::SessionClosed) => SurfaceAction::None,
                Err(e) => {
                    error!("{e}");
                    SurfaceAction::None
                }
            },
            SurfaceEvent::PointerUp => {
                self.end_stroke();
                SurfaceAction::None
            }
            SurfaceEvent::Confirm => match self.confirm() {
                Ok(true) => SurfaceAction::Closed,
                Ok(false) => SurfaceAction::None,
                Err(e) => {
                    error!("confirm failed: {e}");
                    SurfaceAction::None
                }
            },
            SurfaceEvent::Cancel => match self.cancel() {
                Ok(()) => SurfaceAction::Closed,
                Err(e) => {
                    debug!("cancel ignored: {e}");
                    SurfaceAction::None
                }
            },
        }
    }
}
