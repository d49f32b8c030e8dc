//! Export command - write a hand-edited table as the export file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use tokio::io::AsyncReadExt;
use tracing::warn;

use factura_core::{InvoiceRow, InvoiceTable};

use crate::output::{self, OutputArgs};

#[derive(Args)]
pub struct ExportArgs {
    /// Edited table (`Nombre,Monto` rows), or `-` for stdin
    input: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

pub async fn run(args: ExportArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
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

    let table = read_edited(&text)?;
    output::print_table(Some(&table), args.output.json)?;
    output::maybe_export(Some(&table), &args.output, &config.export.file_name)?;
    Ok(())
}

/// Parse an edited table. Amounts that are not plain decimals are kept as
/// typed and reported.
fn read_edited(text: &str) -> anyhow::Result<InvoiceTable> {
    let table = InvoiceTable::parse(text).context("Edited table is malformed")?;
    for row in non_decimal_rows(&table) {
        warn!("Amount for {} is not a plain decimal: '{}'", row.label, row.amount);
    }
    Ok(table)
}

fn non_decimal_rows(table: &InvoiceTable) -> impl Iterator<Item = &InvoiceRow> {
    table.rows().iter().filter(|row| row.value().is_none())
}
