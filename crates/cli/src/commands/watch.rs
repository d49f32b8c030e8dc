//! Watch command - process images dropped into an intake folder.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use tokio::sync::mpsc;
use tracing::{info, warn};

use factura_ocr::pipeline::spawn_intake_watcher;

use crate::engine::PipelineArgs;
use crate::output::{self, OutputArgs};

#[derive(Args)]
pub struct WatchArgs {
    /// Folder to watch for new images
    dir: PathBuf,

    #[command(flatten)]
    pipeline: PipelineArgs,

    #[command(flatten)]
    output: OutputArgs,
}

pub async fn run(args: WatchArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let mut config = super::load_config(config_path)?;
    args.pipeline.apply(&mut config)?;
    let pipeline = args.pipeline.build(&config)?;

    std::fs::create_dir_all(&args.dir)
        .with_context(|| format!("Failed to create intake folder {}", args.dir.display()))?;

    // The channel bridges the notify watcher thread and the async processor.
    let (tx, mut rx) = mpsc::channel::<PathBuf>(64);
    let _watcher = spawn_intake_watcher(&args.dir, tx)
        .with_context(|| format!("Failed to watch {}", args.dir.display()))?;
    info!("Watching intake folder: {}", args.dir.display());

    loop {
        tokio::select! {
            received = rx.recv() => {
                let Some(path) = received else { break };
                match pipeline.process_file(&path, |_| {}).await {
                    Ok(outcome) => {
                        output::print_outcome(&path.display().to_string(), &outcome, args.output.json)?;
                        let file_name = output::export_name(&config, Some(&path));
                        output::maybe_export(outcome.table.as_ref(), &args.output, &file_name)?;
                    }
                    Err(e) => warn!("{}: {e}", path.display()),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping watcher");
                break;
            }
        }
    }
    Ok(())
}
