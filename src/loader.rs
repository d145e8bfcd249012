use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use log::{debug, warn};
use tiny_skia::Pixmap;

use crate::annotate::{ImageKind, SurfaceEvent};
use crate::renderer::pixmap_from_rgba;

#[derive(Clone, Debug)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

pub fn decode(source: &ImageSource) -> Result<Pixmap> {
    let img = match source {
        ImageSource::Path(path) => {
            image::open(path).with_context(|| format!("decode {}", path.display()))?
        }
        ImageSource::Bytes(bytes) => image::load_from_memory(bytes).context("decode bytes")?,
    };
    pixmap_from_rgba(&img.to_rgba8())
}

/// Decodes `source` on a worker thread and posts `ImageReady` back to the UI thread.
///
/// A failed decode is only logged: the surface keeps showing whatever it had.
/// If the receiver is gone the session already ended and the result is dropped.
pub fn spawn_load(
    source: ImageSource,
    kind: ImageKind,
    session: u64,
    tx: Sender<SurfaceEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || match decode(&source) {
        Ok(image) => {
            debug!(
                "{kind:?} image decoded ({}x{})",
                image.width(),
                image.height()
            );
            let event = SurfaceEvent::ImageReady {
                session,
                kind,
                image,
            };
            if tx.send(event).is_err() {
                debug!("{kind:?} image arrived after session {session} closed");
            }
        }
        Err(e) => warn!("{kind:?} image load failed: {e:#}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::mpsc;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([9, 8, 7, 255]));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_load_posts_image_ready() {
        let (tx, rx) = mpsc::channel();
        spawn_load(ImageSource::Bytes(png_bytes(6, 3)), ImageKind::Preview, 7, tx)
            .join()
            .unwrap();
        match rx.recv().unwrap() {
            SurfaceEvent::ImageReady {
                session,
                kind,
                image,
            } => {
                assert_eq!(session, 7);
                assert_eq!(kind, ImageKind::Preview);
                assert_eq!((image.width(), image.height()), (6, 3));
            }
            _ => panic!("expected ImageReady"),
        }
    }

    #[test]
    fn test_bad_bytes_stay_pending() {
        let (tx, rx) = mpsc::channel();
        spawn_load(ImageSource::Bytes(vec![1, 2, 3]), ImageKind::Full, 0, tx)
            .join()
            .unwrap();
        assert!(rx.try_recv().is_err());
    }
}
