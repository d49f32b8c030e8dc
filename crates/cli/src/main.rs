//! Command-line host for the receipt extraction pipeline.

mod commands;
mod engine;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{capture, config, export, extract, process, watch};

/// Extract invoice amounts (base, IVA, total, ...) from receipt photos
#[derive(Parser)]
#[command(name = "factura")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run OCR on image files and extract invoice rows
    Process(process::ProcessArgs),

    /// Read one captured frame from stdin and process it
    Capture(capture::CaptureArgs),

    /// Extract invoice rows from already recognized text
    Extract(extract::ExtractArgs),

    /// Export a hand-edited table as the export file
    Export(export::ExportArgs),

    /// Process images as they appear in a folder
    Watch(watch::WatchArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Process(args) => process::run(args, config_path).await,
        Commands::Capture(args) => capture::run(args, config_path).await,
        Commands::Extract(args) => extract::run(args, config_path).await,
        Commands::Export(args) => export::run(args, config_path).await,
        Commands::Watch(args) => watch::run(args, config_path).await,
        Commands::Config(args) => config::run(args, config_path),
    }
}

/// `RUST_LOG` wins when set; otherwise the level follows `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
