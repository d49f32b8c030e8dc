pub mod capture;
pub mod extract;
pub mod job;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod types;

pub use capture::{CaptureError, CaptureState};
pub use extract::Extractor;
pub use job::{RecognitionEvent, RecognitionJob};
pub use pipeline::{InvoicePipeline, PipelineError, PipelineOutcome};
pub use preprocess::{normalize, target_dimensions, NormalizeOptions, PreprocessError};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError, ProgressSink, UnavailableRecognizer};
pub use types::{NormalizedImage, RawImage, RecognitionProgress, RecognizedText};
