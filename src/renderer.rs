// renderer: composes the displayed photo and the ink strokes into a tiny-skia pixmap.
// The same pixmap feeds both the softbuffer presentation and the confirm snapshot.

use anyhow::{anyhow, Result};
use image::RgbaImage;
use tiny_skia::{
    Color, ColorU8, FilterQuality, IntSize, LineCap, LineJoin, Paint, Pixmap, PixmapPaint,
    Stroke as SkStroke, Transform,
};

use crate::annotate::Stroke;

const BACKGROUND: (u8, u8, u8) = (34, 34, 34);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InkStyle {
    pub color: [u8; 4],
    pub width: f32,
}

impl Default for InkStyle {
    fn default() -> Self {
        Self {
            color: [255, 0, 0, 255],
            width: 5.0,
        }
    }
}

pub struct Renderer {
    pub pixmap: Pixmap,
    ink: InkStyle,
}

impl Renderer {
    pub fn new(width: u32, height: u32, ink: InkStyle) -> Result<Self> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| anyhow!("create pixmap failed"))?;
        Ok(Self { pixmap, ink })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Redraws the whole frame. `None` leaves only the placeholder background.
    pub fn compose(&mut self, image: Option<&Pixmap>, strokes: &[Stroke]) {
        let (r, g, b) = BACKGROUND;
        self.pixmap.fill(Color::from_rgba8(r, g, b, 255));
        let Some(image) = image else {
            return;
        };
        let transform = contain_transform(
            image.width(),
            image.height(),
            self.pixmap.width(),
            self.pixmap.height(),
        );
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, image.as_ref(), &paint, transform, None);

        let mut paint = Paint::default();
        let [r, g, b, a] = self.ink.color;
        paint.set_color(Color::from_rgba8(r, g, b, a));
        paint.anti_alias = true;
        let stroke = SkStroke {
            width: self.ink.width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..SkStroke::default()
        };
        for path in strokes.iter().filter_map(Stroke::to_path) {
            self.pixmap
                .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }

    /// Packs the frame as `0xAARRGGBB` for softbuffer.
    pub fn as_bgra_u32(&self) -> Vec<u32> {
        let data = self.pixmap.data();
        let mut out: Vec<u32> =
            Vec::with_capacity(self.pixmap.width() as usize * self.pixmap.height() as usize);
        for px in data.chunks_exact(4) {
            out.push(u32::from_le_bytes([px[2], px[1], px[0], px[3]]));
        }
        out
    }
}

/// Scale-to-fit and center, preserving aspect ratio.
pub fn contain_transform(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> Transform {
    if src_w == 0 || src_h == 0 {
        return Transform::identity();
    }
    let scale = (dst_w as f32 / src_w as f32).min(dst_h as f32 / src_h as f32);
    let dx = (dst_w as f32 - src_w as f32 * scale) / 2.0;
    let dy = (dst_h as f32 - src_h as f32 * scale) / 2.0;
    Transform::from_row(scale, 0.0, 0.0, scale, dx, dy)
}

/// Converts a straight-alpha RGBA image into a premultiplied pixmap.
pub fn pixmap_from_rgba(img: &RgbaImage) -> Result<Pixmap> {
    let (w, h) = img.dimensions();
    let size = IntSize::from_wh(w, h).ok_or_else(|| anyhow!("empty image {w}x{h}"))?;
    let mut data = Vec::with_capacity((w * h * 4) as usize);
    for px in img.pixels() {
        let [r, g, b, a] = px.0;
        let p = ColorU8::from_rgba(r, g, b, a).premultiply();
        data.extend_from_slice(&[p.red(), p.green(), p.blue(), p.alpha()]);
    }
    Pixmap::from_vec(data, size).ok_or_else(|| anyhow!("pixmap from rgba failed"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::Point;

    #[test]
    fn test_contain_transform_letterboxes_wide_image() {
        let t = contain_transform(400, 100, 200, 200);
        assert!((t.sx - 0.5).abs() < 1e-6);
        assert!((t.sy - 0.5).abs() < 1e-6);
        assert!(t.tx.abs() < 1e-6);
        assert!((t.ty - 75.0).abs() < 1e-6);
    }

    #[test]
    fn test_compose_without_image_is_placeholder() {
        let mut r = Renderer::new(8, 8, InkStyle::default()).unwrap();
        r.compose(None, &[]);
        let px = r.pixmap.pixel(3, 3).unwrap();
        assert_eq!((px.red(), px.green(), px.blue()), BACKGROUND);
    }

    #[test]
    fn test_compose_draws_ink_over_image() {
        let white = RgbaImage::from_pixel(20, 20, image::Rgba([255, 255, 255, 255]));
        let img = pixmap_from_rgba(&white).unwrap();
        let mut stroke = Stroke::starting_at(Point::new(2.0, 10.0));
        stroke.push(Point::new(10.0, 10.0));
        stroke.push(Point::new(18.0, 10.0));

        let mut r = Renderer::new(20, 20, InkStyle::default()).unwrap();
        r.compose(Some(&img), &[stroke]);

        let ink = r.pixmap.pixel(10, 10).unwrap();
        assert_eq!((ink.red(), ink.green(), ink.blue()), (255, 0, 0));
        let paper = r.pixmap.pixel(10, 2).unwrap();
        assert_eq!((paper.red(), paper.green(), paper.blue()), (255, 255, 255));
    }

    #[test]
    fn test_bgra_packing() {
        let mut r = Renderer::new(1, 1, InkStyle::default()).unwrap();
        r.pixmap.fill(Color::from_rgba8(30, 20, 10, 255));
        assert_eq!(r.as_bgra_u32(), vec![0xFF1E140A]);
    }
}
