use std::sync::atomic::{AtomicU8, Ordering};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::trace;

use crate::types::{NormalizedImage, RecognitionProgress};

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine could not read the image: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("OCR engine not available, build with the `tesseract` feature")]
    NotAvailable,
}

/// Abstraction over an OCR engine.
///
/// Implementations run synchronously on a blocking worker and report
/// progress through `progress` as the engine advances.
pub trait OcrBackend: Send + Sync {
    fn recognize(
        &self,
        image: &NormalizedImage,
        locale: &str,
        progress: &ProgressSink,
    ) -> Result<String, OcrError>;
}

// ── Progress sink ─────────────────────────────────────────────────────────────

/// Where a backend reports progress. Percentages that go backwards are
/// dropped, and reports never block the engine: when the consumer lags or
/// has gone away, updates are discarded.
pub struct ProgressSink {
    tx: Option<mpsc::Sender<RecognitionProgress>>,
    last_percent: AtomicU8,
}

impl ProgressSink {
    /// A sink paired with the receiver that observes it.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<RecognitionProgress>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx: Some(tx), last_percent: AtomicU8::new(0) }, rx)
    }

    /// A sink nobody listens to.
    pub fn detached() -> Self {
        Self { tx: None, last_percent: AtomicU8::new(0) }
    }

    pub fn report(&self, progress: RecognitionProgress) {
        let progress = match progress {
            RecognitionProgress::Recognizing(p) => {
                let p = p.min(100);
                let prev = self.last_percent.fetch_max(p, Ordering::Relaxed);
                if p < prev {
                    trace!("Ignoring progress regression {prev}% -> {p}%");
                    return;
                }
                RecognitionProgress::Recognizing(p)
            }
            other => other,
        };
        if let Some(tx) = &self.tx {
            if tx.try_send(progress).is_err() {
                trace!("Progress update dropped: {progress}");
            }
        }
    }

    pub fn recognizing(&self, percent: u8) {
        self.report(RecognitionProgress::Recognizing(percent));
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns preset text after walking through a fixed list of progress steps.
/// Useful for testing the extraction pipeline without Tesseract installed.
pub struct MockRecognizer {
    text: String,
    steps: Vec<u8>,
    failure: Option<String>,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), steps: vec![0, 25, 50, 75, 100], failure: None }
    }

    /// A recognizer whose engine always fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self { failure: Some(message.into()), ..Self::new("") }
    }

    pub fn with_steps(mut self, steps: &[u8]) -> Self {
        self.steps = steps.to_vec();
        self
    }
}

impl OcrBackend for MockRecognizer {
    fn recognize(
        &self,
        _image: &NormalizedImage,
        _locale: &str,
        progress: &ProgressSink,
    ) -> Result<String, OcrError> {
        for &step in &self.steps {
            progress.recognizing(step);
        }
        match &self.failure {
            Some(message) => Err(OcrError::Engine(message.clone())),
            None => Ok(self.text.clone()),
        }
    }
}

/// Stand-in used when no engine was compiled in.
pub struct UnavailableRecognizer;

impl OcrBackend for UnavailableRecognizer {
    fn recognize(
        &self,
        _image: &NormalizedImage,
        _locale: &str,
        _progress: &ProgressSink,
    ) -> Result<String, OcrError> {
        Err(OcrError::NotAvailable)
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrBackend, OcrError, ProgressSink};
    use crate::types::NormalizedImage;
    use leptess::LepTess;
    use std::path::Path;

    pub struct TesseractRecognizer {
        data_path: Option<String>,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<&Path>) -> Self {
            Self { data_path: data_path.map(|p| p.to_string_lossy().into_owned()) }
        }
    }

    impl OcrBackend for TesseractRecognizer {
        fn recognize(
            &self,
            image: &NormalizedImage,
            locale: &str,
            progress: &ProgressSink,
        ) -> Result<String, OcrError> {
            let mut lt = LepTess::new(self.data_path.as_deref(), locale)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            progress.recognizing(0);
            lt.set_image_from_mem(&image.bytes)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            let text = lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))?;
            progress.recognizing(100);
            Ok(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank() -> NormalizedImage {
        NormalizedImage { bytes: vec![], mime: "image/png".into(), width: 1, height: 1 }
    }

    fn drain(rx: &mut mpsc::Receiver<RecognitionProgress>) -> Vec<RecognitionProgress> {
        let mut seen = Vec::new();
        while let Ok(p) = rx.try_recv() {
            seen.push(p);
        }
        seen
    }

    #[test]
    fn mock_returns_preset_text() {
        let r = MockRecognizer::new("TOTAL 5,50\nIVA 1,00");
        let text = r.recognize(&blank(), "spa", &ProgressSink::detached()).unwrap();
        assert_eq!(text, "TOTAL 5,50\nIVA 1,00");
    }

    #[test]
    fn mock_reports_its_steps() {
        let (sink, mut rx) = ProgressSink::channel(16);
        MockRecognizer::new("x").with_steps(&[10, 60, 100]).recognize(&blank(), "spa", &sink).unwrap();
        use RecognitionProgress::Recognizing;
        assert_eq!(drain(&mut rx), vec![Recognizing(10), Recognizing(60), Recognizing(100)]);
    }

    #[test]
    fn failing_mock_reports_engine_error() {
        let r = MockRecognizer::failing("boom");
        let err = r.recognize(&blank(), "spa", &ProgressSink::detached()).unwrap_err();
        assert!(matches!(err, OcrError::Engine(ref m) if m == "boom"));
    }

    #[test]
    fn unavailable_backend_errors() {
        let err = UnavailableRecognizer
            .recognize(&blank(), "spa", &ProgressSink::detached())
            .unwrap_err();
        assert!(matches!(err, OcrError::NotAvailable));
    }

    #[test]
    fn sink_drops_regressions_and_clamps() {
        let (sink, mut rx) = ProgressSink::channel(16);
        sink.report(RecognitionProgress::Initializing);
        for p in [0, 30, 20, 30, 250] {
            sink.recognizing(p);
        }
        use RecognitionProgress::*;
        assert_eq!(
            drain(&mut rx),
            vec![Initializing, Recognizing(0), Recognizing(30), Recognizing(30), Recognizing(100)]
        );
    }

    #[test]
    fn sink_never_blocks_when_full() {
        let (sink, mut rx) = ProgressSink::channel(2);
        for p in 0..=100 {
            sink.recognizing(p);
        }
        assert_eq!(drain(&mut rx).len(), 2);
    }

    #[test]
    fn sink_survives_closed_receiver() {
        let (sink, rx) = ProgressSink::channel(2);
        drop(rx);
        sink.recognizing(50);
    }
}
