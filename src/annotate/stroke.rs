use tiny_skia::{Path, PathBuilder};

use super::geometry::Point;

/// One continuous pointer drag.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stroke {
    points: Vec<Point>,
}

impl Stroke {
    pub fn starting_at(p: Point) -> Self {
        Self { points: vec![p] }
    }

    pub fn push(&mut self, p: Point) {
        self.points.push(p);
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn last_point(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// Smoothed outline: each raw point is the control of a quad ending at the
    /// midpoint to its successor, then a straight tail to the final point.
    /// Single-point strokes produce no path.
    pub fn to_path(&self) -> Option<Path> {
        let (first, rest) = self.points.split_first()?;
        if rest.is_empty() {
            return None;
        }
        let mut pb = PathBuilder::new();
        pb.move_to(first.x, first.y);
        let mut prev = *first;
        for &p in rest {
            let mid = prev.midpoint(p);
            pb.quad_to(prev.x, prev.y, mid.x, mid.y);
            prev = p;
        }
        pb.line_to(prev.x, prev.y);
        pb.finish()
    }
}
