//! Rendering and export of pipeline results.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use tracing::info;

use factura_core::{FacturaConfig, InvoiceTable};
use factura_ocr::{PipelineOutcome, RecognitionProgress, RecognizedText};

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Directory the exported table is written to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Print results as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Do not write the export file
    #[arg(long)]
    pub no_export: bool,
}

// ── Progress ──────────────────────────────────────────────────────────────────

pub fn progress_bar(source: impl Display) -> ProgressBar {
    let pb = ProgressBar::new(100);
    let style = ProgressStyle::with_template("{spinner:.green} {prefix} [{bar:30.cyan/blue}] {pos:>3}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_prefix(source.to_string());
    pb
}

/// Progress callback that drives `pb`.
pub fn progress_reporter(pb: &ProgressBar) -> impl FnMut(RecognitionProgress) + '_ {
    move |progress| {
        match progress {
            RecognitionProgress::Initializing => pb.set_message("initializing"),
            RecognitionProgress::Recognizing(p) => {
                pb.set_position(u64::from(p));
                pb.set_message("recognizing");
            }
            RecognitionProgress::Done => pb.set_message("done"),
        }
        tracing::trace!("{progress}");
    }
}

// ── Rendering ─────────────────────────────────────────────────────────────────

pub fn print_outcome(source: &str, outcome: &PipelineOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        let value = json!({
            "source": source,
            "width": outcome.width,
            "height": outcome.height,
            "text": outcome.text.as_str(),
            "rows": outcome.table,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }
    print_text(source, &outcome.text);
    print_table(outcome.table.as_ref(), false)
}

pub fn print_text(source: &str, text: &RecognizedText) {
    println!("── {source} ──");
    println!("{}", text.as_str().trim_end());
    println!();
}

pub fn print_table(table: Option<&InvoiceTable>, json: bool) -> anyhow::Result<()> {
    match (table, json) {
        (Some(t), true) => println!("{}", serde_json::to_string_pretty(t)?),
        (Some(t), false) => println!("{t}"),
        (None, true) => println!("null"),
        (None, false) => println!("No invoice data detected."),
    }
    Ok(())
}

// ── Export ────────────────────────────────────────────────────────────────────

/// Export file name for `source`. When several sources share one output
/// directory, each export is prefixed with its source's file stem.
pub fn export_name(config: &FacturaConfig, source: Option<&Path>) -> String {
    let base = &config.export.file_name;
    match source.and_then(|s| s.file_stem()).and_then(|s| s.to_str()) {
        Some(stem) => format!("{stem}-{base}"),
        None => base.clone(),
    }
}

/// Write `table` as UTF-8 CSV into `dir`, creating the directory if needed.
pub fn export_table(table: &InvoiceTable, dir: &Path, file_name: &str) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    let path = dir.join(file_name);
    std::fs::write(&path, table.serialize())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Exported {} row(s) to {}", table.len(), path.display());
    Ok(path)
}

/// Export when a table exists and exporting was not disabled.
pub fn maybe_export(
    table: Option<&InvoiceTable>,
    args: &OutputArgs,
    file_name: &str,
) -> anyhow::Result<Option<PathBuf>> {
    match table {
        Some(t) if !args.no_export => export_table(t, &args.output_dir, file_name).map(Some),
        _ => Ok(None),
    }
}
