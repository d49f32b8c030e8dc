use image::ImageFormat;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use factura_core::{FacturaConfig, InvoiceTable};

use crate::extract::Extractor;
use crate::job::RecognitionJob;
use crate::preprocess::{self, NormalizeOptions, PreprocessError};
use crate::recognizer::{OcrBackend, OcrError};
use crate::types::{NormalizedImage, RawImage, RecognitionProgress, RecognizedText};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image could not be normalized: {0}")]
    Decode(#[from] PreprocessError),
    #[error("OCR recognition failed: {0}")]
    Recognition(#[from] OcrError),
}

/// The result of one image's pipeline run.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub width: u32,
    pub height: u32,
    /// Raw OCR text, kept for display and manual editing.
    pub text: RecognizedText,
    /// `None` when the text does not look like an invoice.
    pub table: Option<InvoiceTable>,
}

impl PipelineOutcome {
    pub fn is_invoice(&self) -> bool {
        self.table.is_some()
    }

    /// Export text for the detected table.
    pub fn csv(&self) -> Option<String> {
        self.table.as_ref().map(InvoiceTable::serialize)
    }
}

/// Runs normalize → recognize → extract, strictly in that order.
pub struct InvoicePipeline<R: OcrBackend + ?Sized> {
    recognizer: Arc<R>,
    options: NormalizeOptions,
    locale: String,
}

impl<R: OcrBackend + 'static> InvoicePipeline<R> {
    pub fn new(recognizer: R, options: NormalizeOptions, locale: impl Into<String>) -> Self {
        Self::from_shared(Arc::new(recognizer), options, locale)
    }
}

impl<R: OcrBackend + ?Sized + 'static> InvoicePipeline<R> {
    pub fn from_shared(recognizer: Arc<R>, options: NormalizeOptions, locale: impl Into<String>) -> Self {
        Self { recognizer, options, locale: locale.into() }
    }

    pub fn from_config(recognizer: Arc<R>, config: &FacturaConfig) -> Self {
        Self::from_shared(
            recognizer,
            NormalizeOptions::from(&config.image),
            config.recognition.locale.clone(),
        )
    }

    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn normalize(&self, raw: &RawImage) -> Result<NormalizedImage, PreprocessError> {
        preprocess::normalize(raw, &self.options)
    }

    /// Normalize `raw` and start recognition, leaving the caller to observe
    /// the job's events.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, raw: &RawImage) -> Result<(RecognitionJob, (u32, u32)), PipelineError> {
        let normalized = self.normalize(raw)?;
        let dims = (normalized.width, normalized.height);
        Ok((RecognitionJob::spawn(Arc::clone(&self.recognizer), normalized, self.locale.clone()), dims))
    }

    /// Process one image end to end.
    pub async fn process<F>(&self, raw: &RawImage, on_progress: F) -> Result<PipelineOutcome, PipelineError>
    where
        F: FnMut(RecognitionProgress),
    {
        let (job, (width, height)) = self.start(raw)?;
        let text = job.finish(on_progress).await?;
        let table = Extractor::extract(text.as_str());
        match &table {
            Some(t) => info!("Invoice detected with {} row(s)", t.len()),
            None => info!("No invoice data detected"),
        }
        Ok(PipelineOutcome { width, height, text, table })
    }

    /// Process a file on disk. The MIME type comes from the extension, or from
    /// the content when the extension is unknown.
    pub async fn process_file<F>(&self, path: &Path, on_progress: F) -> Result<PipelineOutcome, PipelineError>
    where
        F: FnMut(RecognitionProgress),
    {
        let bytes = tokio::fs::read(path).await?;
        info!("Processing image: {}", path.display());
        let raw = RawImage::from_path_and_bytes(path, bytes);
        self.process(&raw, on_progress).await
    }
}

// ── Watch-folder integration ──────────────────────────────────────────────────

/// Spawn a notify watcher on `watch_dir` that sends newly created image files
/// to `tx`, waiting for room when the queue is full. Returns the watcher,
/// which must be kept alive for watching to continue.
pub fn spawn_intake_watcher(
    watch_dir: &Path,
    tx: mpsc::Sender<PathBuf>,
) -> notify::Result<impl notify::Watcher> {
    use notify::{EventKind, RecursiveMode, Watcher};

    let mut watcher = notify::recommended_watcher(move |event: notify::Result<notify::Event>| {
        if let Ok(ev) = event {
            if matches!(ev.kind, EventKind::Create(_)) {
                // Runs on the watcher's own thread, so waiting for queue space is fine.
                for path in ev.paths.into_iter().filter(|p| is_image_path(p)) {
                    if let Err(e) = tx.blocking_send(path) {
                        warn!("Intake queue closed, not processing {}", e.0.display());
                    }
                }
            }
        }
    })?;

    watcher.watch(watch_dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

/// Whether the extension names an image format we can decode.
pub fn is_image_path(path: &Path) -> bool {
    ImageFormat::from_path(path).is_ok_and(|f| f.reading_enabled())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
