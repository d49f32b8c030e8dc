//! Process command - OCR image files and extract invoice rows.

use std::path::{Path, PathBuf};

use clap::Args;
use tracing::error;

use crate::engine::PipelineArgs;
use crate::output::{self, OutputArgs};

#[derive(Args)]
pub struct ProcessArgs {
    /// Image files (JPEG, PNG, ...)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    #[command(flatten)]
    pipeline: PipelineArgs,

    #[command(flatten)]
    output: OutputArgs,
}

pub async fn run(args: ProcessArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let mut config = super::load_config(config_path)?;
    args.pipeline.apply(&mut config)?;
    let pipeline = args.pipeline.build(&config)?;

    let many = args.inputs.len() > 1;
    let mut failed = 0usize;

    // Each image is its own run: a failure is reported and the next one starts fresh.
    for input in &args.inputs {
        let pb = output::progress_bar(input.display());
        let result = pipeline.process_file(input, output::progress_reporter(&pb)).await;
        pb.finish_and_clear();

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("{}: {e}", input.display());
                failed += 1;
                continue;
            }
        };

        output::print_outcome(&input.display().to_string(), &outcome, args.output.json)?;
        let file_name = output::export_name(&config, many.then_some(input.as_path()));
        output::maybe_export(outcome.table.as_ref(), &args.output, &file_name)?;
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} image(s) could not be processed", args.inputs.len());
    }
    Ok(())
}
