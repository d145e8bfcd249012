use tiny_skia::Pixmap;

/// Which of the two session sources finished loading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageKind {
    Preview,
    Full,
}

/// The photo currently under the ink.
///
/// Quality only moves forward: a full image replaces a preview, a preview
/// never replaces a full image.
#[derive(Default)]
pub enum DisplayImage {
    #[default]
    Pending,
    Preview(Pixmap),
    Full(Pixmap),
}

impl DisplayImage {
    /// Returns true when `pixmap` became the displayed image.
    pub fn offer(&mut self, kind: ImageKind, pixmap: Pixmap) -> bool {
        if kind == ImageKind::Preview && matches!(self, DisplayImage::Full(_)) {
            return false;
        }
        *self = match kind {
            ImageKind::Preview => DisplayImage::Preview(pixmap),
            ImageKind::Full => DisplayImage::Full(pixmap),
        };
        true
    }

    pub fn current(&self) -> Option<&Pixmap> {
        match self {
            DisplayImage::Pending => None,
            DisplayImage::Preview(p) | DisplayImage::Full(p) => Some(p),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, DisplayImage::Pending)
    }

    pub fn kind(&self) -> Option<ImageKind> {
        match self {
            DisplayImage::Pending => None,
            DisplayImage::Preview(_) => Some(ImageKind::Preview),
            DisplayImage::Full(_) => Some(ImageKind::Full),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(w: u32) -> Pixmap {
        Pixmap::new(w, w).expect("pixmap")
    }

    #[test]
    fn test_full_replaces_preview() {
        let mut slot = DisplayImage::default();
        assert!(slot.offer(ImageKind::Preview, px(4)));
        assert_eq!(slot.kind(), Some(ImageKind::Preview));
        assert!(slot.offer(ImageKind::Full, px(16)));
        assert_eq!(slot.kind(), Some(ImageKind::Full));
        assert_eq!(slot.current().map(|p| p.width()), Some(16));
    }

    #[test]
    fn test_late_preview_is_ignored() {
        let mut slot = DisplayImage::default();
        assert!(slot.offer(ImageKind::Full, px(16)));
        assert!(!slot.offer(ImageKind::Preview, px(4)));
        assert_eq!(slot.current().map(|p| p.width()), Some(16));
    }

    #[test]
    fn test_pending_until_first_offer() {
        let slot = DisplayImage::default();
        assert!(slot.is_pending());
        assert!(slot.current().is_none());
    }
}
