use anyhow::{anyhow, Result};
use arboard::Clipboard;

/// Where recognized LaTeX ends up.
pub trait TextSink {
    fn put_text(&mut self, text: &str) -> Result<()>;
}

pub struct SystemClipboard {
    inner: Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self> {
        let inner = Clipboard::new().map_err(|e| anyhow!("failed to initialize clipboard: {e}"))?;
        Ok(Self { inner })
    }
}

impl TextSink for SystemClipboard {
    fn put_text(&mut self, text: &str) -> Result<()> {
        self.inner
            .set_text(text)
            .map_err(|e| anyhow!("failed to copy to clipboard: {e}"))?;
        log::info!("LaTeX copied to clipboard");
        Ok(())
    }
}

/// Prints to stdout instead of touching the clipboard.
pub struct StdoutSink;

impl TextSink for StdoutSink {
    fn put_text(&mut self, text: &str) -> Result<()> {
        println!("{text}");
        Ok(())
    }
}
