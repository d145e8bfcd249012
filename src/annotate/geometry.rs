/// A pointer position in surface coordinates (logical pixels, origin top-left).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Running axis-aligned box around every inked point of a session.
///
/// Starts as the empty sentinel `(+inf, +inf, -inf, -inf)` and only ever grows.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl BoundingBox {
    pub const EMPTY: BoundingBox = BoundingBox {
        min_x: f32::INFINITY,
        min_y: f32::INFINITY,
        max_x: f32::NEG_INFINITY,
        max_y: f32::NEG_INFINITY,
    };

    pub fn is_empty(&self) -> bool {
        !(self.min_x <= self.max_x && self.min_y <= self.max_y)
    }

    pub fn include(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// `(min_x, min_y, max_x, max_y)`, or `None` while no ink has been recorded.
    pub fn rect(&self) -> Option<(f32, f32, f32, f32)> {
        if self.is_empty() {
            return None;
        }
        Some((self.min_x, self.min_y, self.max_x, self.max_y))
    }

    /// Integer pixel region `(x, y, w, h)` of this box clipped to a `width`x`height` surface.
    ///
    /// Each edge rounds to the nearest pixel, so an unclipped width or height stays
    /// within one pixel of the float extent. A box that collapses to a line still
    /// yields one pixel.
    pub fn pixel_rect(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let (min_x, min_y, max_x, max_y) = self.rect()?;
        if width == 0 || height == 0 {
            return None;
        }
        let (sw, sh) = (width as f32, height as f32);
        if max_x < 0.0 || max_y < 0.0 || min_x > sw || min_y > sh {
            return None;
        }
        let x0 = min_x.round().clamp(0.0, sw - 1.0);
        let y0 = min_y.round().clamp(0.0, sh - 1.0);
        let x1 = max_x.round().clamp(x0 + 1.0, sw);
        let y1 = max_y.round().clamp(y0 + 1.0, sh);
        Some((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
    }
}
