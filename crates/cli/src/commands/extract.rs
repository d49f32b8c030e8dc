//! Extract command - run the field extractor on text that was already recognized.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use tokio::io::AsyncReadExt;

use factura_ocr::Extractor;

use crate::output::{self, OutputArgs};

#[derive(Args)]
pub struct ExtractArgs {
    /// Text file with OCR output, or `-` for stdin
    input: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

pub async fn run(args: ExtractArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;

    let text = if args.input.as_os_str() == "-" {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        buf
    } else {
        tokio::fs::read_to_string(&args.input)
            .await
            .with_context(|| format!("Failed to read {}", args.input.display()))?
    };

    let table = Extractor::extract(&text);
    output::print_table(table.as_ref(), args.output.json)?;
    output::maybe_export(table.as_ref(), &args.output, &config.export.file_name)?;
    Ok(())
}
