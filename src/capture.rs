use std::io::Cursor;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageReader};
use serde::{Deserialize, Serialize};
use tiny_skia::Pixmap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    #[default]
    Png,
    Jpeg,
}

impl SnapshotFormat {
    pub fn mime(self) -> &'static str {
        match self {
            SnapshotFormat::Png => "image/png",
            SnapshotFormat::Jpeg => "image/jpeg",
        }
    }
}

/// A self-contained encoded raster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedImage {
    pub format: SnapshotFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.format.mime(), self.to_base64())
    }
}

/// Crops `(x, y, w, h)` out of a composed frame and encodes it.
pub fn encode_region(
    pixmap: &Pixmap,
    rect: (u32, u32, u32, u32),
    format: SnapshotFormat,
    jpeg_quality: u8,
) -> Result<EncodedImage> {
    let (x, y, w, h) = rect;
    let (sw, sh) = (pixmap.width(), pixmap.height());
    if w == 0 || h == 0 || x >= sw || y >= sh {
        return Err(anyhow!("crop {w}x{h}+{x}+{y} outside {sw}x{sh} frame"));
    }
    let rw = w.min(sw - x);
    let rh = h.min(sh - y);
    let mut rgba: Vec<u8> = Vec::with_capacity((rw * rh * 4) as usize);
    let pixels = pixmap.pixels();
    for row in 0..rh {
        let start = ((y + row) * sw + x) as usize;
        for px in &pixels[start..start + rw as usize] {
            let c = px.demultiply();
            rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
    }
    encode_rgba(&rgba, rw, rh, format, jpeg_quality)
}

pub fn encode_rgba(
    rgba: &[u8],
    w: u32,
    h: u32,
    format: SnapshotFormat,
    jpeg_quality: u8,
) -> Result<EncodedImage> {
    let mut data = Vec::new();
    match format {
        SnapshotFormat::Png => {
            PngEncoder::new(Cursor::new(&mut data))
                .write_image(rgba, w, h, ExtendedColorType::Rgba8)
                .context("png encode")?;
        }
        SnapshotFormat::Jpeg => {
            // jpeg has no alpha channel
            let rgb: Vec<u8> = rgba
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect();
            JpegEncoder::new_with_quality(Cursor::new(&mut data), jpeg_quality)
                .write_image(&rgb, w, h, ExtendedColorType::Rgb8)
                .context("jpeg encode")?;
        }
    }
    Ok(EncodedImage {
        format,
        width: w,
        height: h,
        bytes: data,
    })
}

/// Reads a whole photo from disk and re-encodes it for upload.
pub fn load_photo(path: &Path, format: SnapshotFormat, jpeg_quality: u8) -> Result<EncodedImage> {
    let img = ImageReader::open(path)
        .with_context(|| format!("open {}", path.display()))?
        .with_guessed_format()?
        .decode()
        .with_context(|| format!("decode {}", path.display()))?
        .to_rgba8();
    let (w, h) = img.dimensions();
    log::debug!("loaded photo {} ({w}x{h})", path.display());
    encode_rgba(img.as_raw(), w, h, format, jpeg_quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::Color;

    const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

    #[test]
    fn test_encode_png_signature() {
        let mut data = Vec::new();
        data.extend_from_slice(&[255, 0, 0, 255]);
        data.extend_from_slice(&[0, 255, 0, 255]);
        let png = encode_rgba(&data, 2, 1, SnapshotFormat::Png, 90).unwrap();
        assert!(png.bytes.starts_with(&PNG_SIGNATURE));
        assert_eq!((png.width, png.height), (2, 1));
    }

    #[test]
    fn test_encode_region_dimensions() {
        let mut pm = Pixmap::new(200, 200).unwrap();
        pm.fill(Color::from_rgba8(10, 200, 30, 255));
        let out = encode_region(&pm, (10, 10, 40, 40), SnapshotFormat::Png, 90).unwrap();
        let decoded = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 40));
        assert_eq!(decoded.to_rgba8().get_pixel(5, 5).0, [10, 200, 30, 255]);
    }

    #[test]
    fn test_encode_region_clamps_overhang() {
        let pm = Pixmap::new(50, 50).unwrap();
        let out = encode_region(&pm, (40, 45, 30, 30), SnapshotFormat::Png, 90).unwrap();
        assert_eq!((out.width, out.height), (10, 5));
    }

    #[test]
    fn test_encode_region_rejects_outside() {
        let pm = Pixmap::new(50, 50).unwrap();
        assert!(encode_region(&pm, (60, 0, 5, 5), SnapshotFormat::Png, 90).is_err());
    }

    #[test]
    fn test_jpeg_data_uri() {
        let rgba = vec![128u8; 4 * 4 * 4];
        let jpg = encode_rgba(&rgba, 4, 4, SnapshotFormat::Jpeg, 80).unwrap();
        assert!(jpg.bytes.starts_with(&[0xFF, 0xD8]));
        assert!(jpg.to_data_uri().starts_with("data:image/jpeg;base64,"));
    }
}
