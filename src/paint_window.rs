// paint_window: winit window that hosts an AnnotationSurface.
// Translates mouse/keyboard input into surface events and presents composed frames via softbuffer.

use anyhow::{anyhow, Result};
use log::warn;
use softbuffer::{Context, Surface};
use std::num::NonZeroU32;
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorIcon, Window, WindowAttributes},
};

use crate::annotate::{AnnotationSurface, Point, SurfaceAction, SurfaceEvent};

/// Pointer and key state that turns raw window input into surface events.
#[derive(Debug, Default)]
pub struct InputMapper {
    last_cursor: (f64, f64),
    pointer_down: bool,
}

impl InputMapper {
    /// Moves only matter while the button is held and a stroke actually started.
    pub fn cursor_moved(&mut self, x: f64, y: f64, stroke_active: bool) -> Option<SurfaceEvent> {
        self.last_cursor = (x, y);
        (self.pointer_down && stroke_active).then(|| SurfaceEvent::PointerMove(self.cursor_point()))
    }

    pub fn left_button(&mut self, state: ElementState) -> SurfaceEvent {
        match state {
            ElementState::Pressed => {
                self.pointer_down = true;
                SurfaceEvent::PointerDown(self.cursor_point())
            }
            ElementState::Released => {
                self.pointer_down = false;
                SurfaceEvent::PointerUp
            }
        }
    }

    pub fn key_pressed(code: KeyCode) -> Option<SurfaceEvent> {
        match code {
            KeyCode::Enter | KeyCode::NumpadEnter | KeyCode::Space => Some(SurfaceEvent::Confirm),
            KeyCode::Escape => Some(SurfaceEvent::Cancel),
            _ => None,
        }
    }

    fn cursor_point(&self) -> Point {
        Point::new(self.last_cursor.0 as f32, self.last_cursor.1 as f32)
    }
}

pub struct PaintWindow {
    pub window: &'static Window,
    _context: Context<&'static Window>,
    surface: Surface<&'static Window, &'static Window>,
    pub annotation: AnnotationSurface,
    input: InputMapper,
}

impl PaintWindow {
    pub fn new(active: &ActiveEventLoop, annotation: AnnotationSurface) -> Result<Self> {
        let (w, h) = annotation.size();
        let attrs = WindowAttributes::default()
            .with_title("mathsnap - circle the math, Enter to send, Esc to cancel")
            .with_resizable(false)
            .with_inner_size(PhysicalSize::new(w, h)); // physical pixels, same space as the surface
        let window = active.create_window(attrs)?;
        let window: &'static Window = Box::leak(Box::new(window));
        window.set_cursor(CursorIcon::Crosshair);

        let context = Context::new(window).map_err(|e| anyhow!("paint ctx: {e}"))?;
        let surface = Surface::new(&context, window).map_err(|e| anyhow!("paint surface: {e}"))?;
        window.request_redraw();
        Ok(Self {
            window,
            _context: context,
            surface,
            annotation,
            input: InputMapper::default(),
        })
    }

    /// Feeds a surface event and schedules a redraw when the frame changed.
    pub fn dispatch(&mut self, event: SurfaceEvent) -> SurfaceAction {
        let action = self.annotation.handle_event(event);
        if action == SurfaceAction::Redraw {
            self.window.request_redraw();
        }
        action
    }

    pub fn handle_event(&mut self, event: &WindowEvent) -> SurfaceAction {
        let mapped = match event {
            WindowEvent::CursorMoved { position, .. } => {
                let active = self.annotation.has_active_stroke();
                self.input.cursor_moved(position.x, position.y, active)
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => Some(self.input.left_button(*state)),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => InputMapper::key_pressed(*code),
            WindowEvent::CloseRequested => Some(SurfaceEvent::Cancel),
            WindowEvent::Resized(_) => {
                self.window.request_redraw();
                None
            }
            _ => None,
        };
        match mapped {
            Some(ev) => self.dispatch(ev),
            None => SurfaceAction::None,
        }
    }

    pub fn redraw(&mut self) {
        let (w, h) = self.annotation.size();
        let (Some(nw), Some(nh)) = (NonZeroU32::new(w), NonZeroU32::new(h)) else {
            return;
        };
        if let Err(e) = self.surface.resize(nw, nh) {
            warn!("paint surface resize failed: {e}");
            return;
        }
        let frame = self.annotation.compose().as_bgra_u32();
        match self.surface.buffer_mut() {
            Ok(mut buf) => {
                let n = buf.len().min(frame.len());
                buf[..n].copy_from_slice(&frame[..n]);
                if let Err(e) = buf.present() {
                    warn!("paint present failed: {e}");
                }
            }
            Err(e) => warn!("paint buffer unavailable: {e}"),
        }
    }
}
