use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::Result;
use log::warn;

use crate::capture::EncodedImage;
use crate::clipboard::TextSink;
use crate::recognize::{CaptureMode, Recognizer, NO_MATH_FOUND};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transcription {
    Latex(String),
    NoMath,
}

/// Recognizes `image` and hands the LaTeX to `sink`. A "no math" answer is not copied.
pub fn transcribe(
    recognizer: &dyn Recognizer,
    sink: &mut dyn TextSink,
    image: &EncodedImage,
    mode: CaptureMode,
) -> Result<Transcription> {
    let latex = recognizer.recognize(image, mode)?;
    deliver(sink, &latex)
}

pub fn deliver(sink: &mut dyn TextSink, latex: &str) -> Result<Transcription> {
    let latex = latex.trim();
    if latex.is_empty() || latex.eq_ignore_ascii_case(NO_MATH_FOUND) {
        warn!("model found no math in the image");
        return Ok(Transcription::NoMath);
    }
    sink.put_text(latex)?;
    Ok(Transcription::Latex(latex.to_string()))
}

/// Runs the recognition request off the UI thread; the raw result comes back on `tx`.
pub fn spawn_recognize(
    recognizer: Arc<dyn Recognizer>,
    image: EncodedImage,
    mode: CaptureMode,
    tx: Sender<Result<String>>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let result = recognizer.recognize(&image, mode).map_err(anyhow::Error::from);
        let _ = tx.send(result);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::SnapshotFormat;
    use crate::error::RecognizeError;
    use std::sync::{mpsc, Mutex};

    struct FixedRecognizer {
        reply: Result<String, u16>,
        seen: Mutex<Vec<CaptureMode>>,
    }

    impl Recognizer for FixedRecognizer {
        fn recognize(
            &self,
            _image: &EncodedImage,
            mode: CaptureMode,
        ) -> Result<String, RecognizeError> {
            self.seen.lock().unwrap().push(mode);
            self.reply.clone().map_err(|status| RecognizeError::Status {
                status,
                body: "boom".into(),
            })
        }
    }

    #[derive(Default)]
    struct VecSink(Vec<String>);

    impl TextSink for VecSink {
        fn put_text(&mut self, text: &str) -> Result<()> {
            self.0.push(text.to_string());
            Ok(())
        }
    }

    fn fixed(reply: Result<String, u16>) -> FixedRecognizer {
        FixedRecognizer {
            reply,
            seen: Mutex::new(Vec::new()),
        }
    }

    fn image() -> EncodedImage {
        EncodedImage {
            format: SnapshotFormat::Png,
            width: 2,
            height: 2,
            bytes: vec![0; 4],
        }
    }

    #[test]
    fn test_latex_goes_to_sink() {
        let rec = fixed(Ok(" x^2 + 1 \n".into()));
        let mut sink = VecSink::default();
        let out = transcribe(&rec, &mut sink, &image(), CaptureMode::Paint).unwrap();
        assert_eq!(out, Transcription::Latex("x^2 + 1".into()));
        assert_eq!(sink.0, vec!["x^2 + 1".to_string()]);
        assert_eq!(*rec.seen.lock().unwrap(), vec![CaptureMode::Paint]);
    }

    #[test]
    fn test_no_math_is_not_copied() {
        let rec = fixed(Ok("No math found".into()));
        let mut sink = VecSink::default();
        let out = transcribe(&rec, &mut sink, &image(), CaptureMode::Direct).unwrap();
        assert_eq!(out, Transcription::NoMath);
        assert!(sink.0.is_empty());
    }

    #[test]
    fn test_no_math_match_ignores_case_and_whitespace() {
        let mut sink = VecSink::default();
        assert_eq!(deliver(&mut sink, "  no MATH found\n").unwrap(), Transcription::NoMath);
        assert_eq!(deliver(&mut sink, " \n").unwrap(), Transcription::NoMath);
        assert!(sink.0.is_empty());
    }

    #[test]
    fn test_endpoint_error_propagates() {
        let rec = fixed(Err(500));
        let mut sink = VecSink::default();
        let err = transcribe(&rec, &mut sink, &image(), CaptureMode::Direct).unwrap_err();
        assert!(err.to_string().contains("500"));
        assert!(sink.0.is_empty());
    }

    #[test]
    fn test_spawn_recognize_reports_back() {
        let rec: Arc<dyn Recognizer> = Arc::new(fixed(Ok("a+b".into())));
        let (tx, rx) = mpsc::channel();
        spawn_recognize(rec, image(), CaptureMode::Paint, tx)
            .join()
            .unwrap();
        assert_eq!(rx.recv().unwrap().unwrap(), "a+b");
    }
}
