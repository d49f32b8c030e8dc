use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::keyword::Keyword;

/// Header line of every exported table.
pub const HEADER: &str = "Nombre,Monto";

/// Default name of the exported file.
pub const EXPORT_FILE_NAME: &str = "factura.csv";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("Line {line} has no ',' separator: '{content}'")]
    MissingSeparator { line: usize, content: String },
}

/// One extracted (label, amount) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRow {
    pub label: String,
    /// Canonical amount: `.` as decimal point, no grouping, no currency symbol.
    pub amount: String,
}

impl InvoiceRow {
    pub fn new(label: impl Into<String>, amount: impl Into<String>) -> Self {
        Self { label: label.into(), amount: amount.into() }
    }

    pub fn for_keyword(keyword: Keyword, amount: impl Into<String>) -> Self {
        Self::new(keyword.label(), amount)
    }

    /// Numeric value of the amount, when it parses as a plain decimal.
    pub fn value(&self) -> Option<Decimal> {
        Decimal::from_str(&self.amount).ok()
    }
}

impl fmt::Display for InvoiceRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.label, self.amount)
    }
}

/// Ordered rows of an invoice, rendered under the `Nombre,Monto` header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceTable {
    rows: Vec<InvoiceRow>,
}

impl InvoiceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<InvoiceRow>) -> Self {
        Self { rows }
    }

    pub fn push(&mut self, row: InvoiceRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[InvoiceRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<InvoiceRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as export text: the header, a newline, then one `label,amount`
    /// line per row. No trailing newline after the last row.
    pub fn serialize(&self) -> String {
        let body: Vec<String> = self.rows.iter().map(InvoiceRow::to_string).collect();
        format!("{HEADER}\n{}", body.join("\n"))
    }

    /// Read back a table the user may have edited by hand.
    ///
    /// Blank lines are skipped and a leading header line is optional. Each row
    /// is split at its first comma, so an amount like `1.234,56` survives.
    pub fn parse(text: &str) -> Result<Self, TableError> {
        let mut rows = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || (rows.is_empty() && line == HEADER) {
                continue;
            }
            let (label, amount) =
                line.split_once(',').ok_or_else(|| TableError::MissingSeparator {
                    line: idx + 1,
                    content: line.to_string(),
                })?;
            rows.push(InvoiceRow::new(label.trim(), amount.trim()));
        }
        Ok(Self { rows })
    }
}

impl fmt::Display for InvoiceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl FromStr for InvoiceTable {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl FromIterator<InvoiceRow> for InvoiceTable {
    fn from_iter<I: IntoIterator<Item = InvoiceRow>>(iter: I) -> Self {
        Self { rows: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> InvoiceTable {
        InvoiceTable::from_rows(vec![
            InvoiceRow::for_keyword(Keyword::Base, "100.00"),
            InvoiceRow::for_keyword(Keyword::Iva, "21.00"),
            InvoiceRow::for_keyword(Keyword::Total, "121.00"),
        ])
    }

    #[test]
    fn serialize_exact_bytes() {
        assert_eq!(
            sample().serialize(),
            "Nombre,Monto\nBase,100.00\nIva,21.00\nTotal,121.00"
        );
    }

    #[test]
    fn serialize_empty_table_is_header_only() {
        assert_eq!(InvoiceTable::new().serialize(), "Nombre,Monto\n");
    }

    #[test]
    fn display_matches_serialize() {
        let t = sample();
        assert_eq!(t.to_string(), t.serialize());
    }

    #[test]
    fn serialize_does_not_validate_amounts() {
        let t = InvoiceTable::from_rows(vec![InvoiceRow::new("Total", "1.234,56")]);
        assert_eq!(t.serialize(), "Nombre,Monto\nTotal,1.234,56");
    }

    #[test]
    fn parse_reads_serialized_table() {
        let t = sample();
        assert_eq!(InvoiceTable::parse(&t.serialize()).unwrap(), t);
    }

    #[test]
    fn parse_accepts_user_edits() {
        let edited = "Nombre,Monto\r\nBase,100.00\r\n\r\nDescuento , 5.00\nTotal,1.234,56\n";
        let t: InvoiceTable = edited.parse().unwrap();
        assert_eq!(
            t.rows(),
            &[
                InvoiceRow::new("Base", "100.00"),
                InvoiceRow::new("Descuento", "5.00"),
                InvoiceRow::new("Total", "1.234,56"),
            ]
        );
    }

    #[test]
    fn parse_without_header() {
        let t = InvoiceTable::parse("Neto,50.00").unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.rows()[0].label, "Neto");
    }

    #[test]
    fn parse_rejects_row_without_separator() {
        let err = InvoiceTable::parse("Nombre,Monto\nTotal 12.00").unwrap_err();
        assert_eq!(
            err,
            TableError::MissingSeparator { line: 2, content: "Total 12.00".into() }
        );
    }

    #[test]
    fn row_value_parses_canonical_amounts() {
        assert_eq!(
            InvoiceRow::new("Total", "1234.56").value(),
            Some(Decimal::new(123456, 2))
        );
        assert_eq!(InvoiceRow::new("Total", "1.234,56").value(), None);
    }

    #[test]
    fn json_is_a_plain_array() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.starts_with(r#"[{"label":"Base","amount":"100.00"}"#));
        let back: InvoiceTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());
    }
}
