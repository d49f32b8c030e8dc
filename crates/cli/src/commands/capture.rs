//! Capture command - treat stdin as a camera and process the captured frame.

use std::path::Path;

use clap::Args;
use tokio::io::AsyncReadExt;
use tracing::debug;

use factura_ocr::{CaptureState, RawImage};

use crate::engine::PipelineArgs;
use crate::output::{self, OutputArgs};

#[derive(Args)]
pub struct CaptureArgs {
    /// MIME type of the frame; sniffed from its bytes when omitted
    #[arg(long)]
    mime: Option<String>,

    #[command(flatten)]
    pipeline: PipelineArgs,

    #[command(flatten)]
    output: OutputArgs,
}

pub async fn run(args: CaptureArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let mut config = super::load_config(config_path)?;
    args.pipeline.apply(&mut config)?;
    let pipeline = args.pipeline.build(&config)?;

    let mut device = CaptureState::default();
    device.activate()?;

    let mut bytes = Vec::new();
    tokio::io::stdin().read_to_end(&mut bytes).await?;
    if bytes.is_empty() {
        device.deactivate();
        anyhow::bail!("No image data on stdin");
    }

    let frame = match &args.mime {
        Some(mime) => RawImage::new(bytes, mime.as_str()),
        None => RawImage::sniffed(bytes),
    };
    debug!("Captured {} bytes ({})", frame.len(), frame.mime());
    device.capture(frame)?;
    let frame = device.accept()?;

    let pb = output::progress_bar("stdin");
    let result = pipeline.process(&frame, output::progress_reporter(&pb)).await;
    pb.finish_and_clear();
    let outcome = result?;

    output::print_outcome("stdin", &outcome, args.output.json)?;
    output::maybe_export(outcome.table.as_ref(), &args.output, &config.export.file_name)?;
    Ok(())
}
