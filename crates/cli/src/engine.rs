//! Pipeline construction shared by the image-processing commands.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;

use factura_core::FacturaConfig;
use factura_ocr::{InvoicePipeline, MockRecognizer, OcrBackend};

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Engine {
    /// Tesseract via libtesseract (needs the `tesseract` feature)
    Tesseract,
    /// Return the text given with --mock-text, for dry runs
    Mock,
}

#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// OCR engine
    #[arg(short, long, value_enum, default_value = "tesseract")]
    engine: Engine,

    /// Text file the mock engine returns
    #[arg(long)]
    mock_text: Option<PathBuf>,

    /// Maximum image width before recognition
    #[arg(long)]
    max_width: Option<u32>,

    /// Maximum image height before recognition
    #[arg(long)]
    max_height: Option<u32>,

    /// Re-encode quality in (0, 1]
    #[arg(long)]
    quality: Option<f32>,

    /// Recognition language
    #[arg(short, long)]
    locale: Option<String>,
}

impl PipelineArgs {
    /// Apply command-line overrides on top of the loaded config.
    pub fn apply(&self, config: &mut FacturaConfig) -> anyhow::Result<()> {
        if let Some(w) = self.max_width {
            config.image.max_width = w;
        }
        if let Some(h) = self.max_height {
            config.image.max_height = h;
        }
        if let Some(q) = self.quality {
            config.image.quality = q;
        }
        if let Some(locale) = &self.locale {
            config.recognition.locale = locale.clone();
        }
        config.validate()?;
        Ok(())
    }

    pub fn build(&self, config: &FacturaConfig) -> anyhow::Result<InvoicePipeline<dyn OcrBackend>> {
        let backend: Arc<dyn OcrBackend> = match self.engine {
            Engine::Mock => {
                let text = match &self.mock_text {
                    Some(path) => std::fs::read_to_string(path)
                        .with_context(|| format!("Failed to read mock text {}", path.display()))?,
                    None => String::new(),
                };
                Arc::new(MockRecognizer::new(text))
            }
            Engine::Tesseract => tesseract(config),
        };
        Ok(InvoicePipeline::from_config(backend, config))
    }
}

#[cfg(feature = "tesseract")]
fn tesseract(config: &FacturaConfig) -> Arc<dyn OcrBackend> {
    use factura_ocr::recognizer::tesseract_backend::TesseractRecognizer;
    Arc::new(TesseractRecognizer::new(config.recognition.tessdata_dir.as_deref()))
}

#[cfg(not(feature = "tesseract"))]
fn tesseract(_config: &FacturaConfig) -> Arc<dyn OcrBackend> {
    tracing::warn!("Built without the `tesseract` feature; recognition will fail");
    Arc::new(factura_ocr::UnavailableRecognizer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        pipeline: PipelineArgs,
    }

    fn parse(args: &[&str]) -> PipelineArgs {
        let mut argv = vec!["test"];
        argv.extend_from_slice(args);
        Harness::try_parse_from(argv).unwrap().pipeline
    }

    #[test]
    fn overrides_replace_config_values() {
        let args = parse(&["--max-width", "800", "--quality", "0.5", "-l", "eng"]);
        let mut config = FacturaConfig::default();
        args.apply(&mut config).unwrap();
        assert_eq!(config.image.max_width, 800);
        assert_eq!(config.image.max_height, 1024);
        assert_eq!(config.image.quality, 0.5);
        assert_eq!(config.recognition.locale, "eng");
    }

    #[test]
    fn invalid_override_is_rejected() {
        let args = parse(&["--quality", "2"]);
        assert!(args.apply(&mut FacturaConfig::default()).is_err());
    }

    #[test]
    fn default_engine_is_tesseract() {
        assert_eq!(parse(&[]).engine, Engine::Tesseract);
    }

    #[tokio::test]
    async fn mock_engine_reads_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("ocr.txt");
        std::fs::write(&text, "IVA 21,00").unwrap();

        let args = parse(&["--engine", "mock", "--mock-text", text.to_str().unwrap()]);
        let pipeline = args.build(&FacturaConfig::default()).unwrap();

        let img = dir.path().join("frame.png");
        image_fixture(&img);
        let out = pipeline.process_file(&img, |_| {}).await.unwrap();
        assert_eq!(out.csv().unwrap(), "Nombre,Monto\nIva,21.00");
    }

    #[test]
    fn mock_engine_missing_text_file() {
        let args = parse(&["--engine", "mock", "--mock-text", "/nonexistent/ocr.txt"]);
        assert!(args.build(&FacturaConfig::default()).is_err());
    }

    fn image_fixture(path: &std::path::Path) {
        image::GrayImage::from_pixel(4, 4, image::Luma([255u8])).save(path).unwrap();
    }
}
