use image::ImageFormat;
use std::fmt;
use std::path::Path;

const UNKNOWN_MIME: &str = "application/octet-stream";

/// Image payload as delivered by a file picker or capture device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    bytes: Vec<u8>,
    mime: String,
}

impl RawImage {
    pub fn new(bytes: impl Into<Vec<u8>>, mime: impl Into<String>) -> Self {
        Self { bytes: bytes.into(), mime: mime.into() }
    }

    /// Declare the MIME type from the content's magic bytes.
    pub fn sniffed(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let mime = image::guess_format(&bytes)
            .map(|f| f.to_mime_type())
            .unwrap_or(UNKNOWN_MIME);
        Self::new(bytes, mime)
    }

    /// Declare the MIME type from the file extension, falling back to sniffing.
    pub fn from_path_and_bytes(path: &Path, bytes: impl Into<Vec<u8>>) -> Self {
        match ImageFormat::from_path(path) {
            Ok(format) => Self::new(bytes, format.to_mime_type()),
            Err(_) => Self::sniffed(bytes),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Re-encoded image bounded to the configured dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub width: u32,
    pub height: u32,
}

/// Status reported while the OCR engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionProgress {
    Initializing,
    /// Percent complete, 0–100.
    Recognizing(u8),
    Done,
}

impl fmt::Display for RecognitionProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecognitionProgress::Initializing => write!(f, "initializing"),
            RecognitionProgress::Recognizing(p) => write!(f, "recognizing {p}%"),
            RecognitionProgress::Done => write!(f, "done"),
        }
    }
}

/// Full OCR output for one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedText(String);

impl RecognizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for RecognizedText {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RecognizedText {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for RecognizedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecognizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
