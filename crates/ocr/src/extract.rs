use tracing::{debug, trace};

use factura_core::{parse_amount, InvoiceRow, InvoiceTable, Keyword};

pub struct Extractor;

impl Extractor {
    /// Scan recognized text for keyword/amount lines.
    ///
    /// Returns `None` when no line qualifies, meaning the text does not look
    /// like an invoice. Rows keep the order their lines appear in.
    pub fn extract(ocr_text: &str) -> Option<InvoiceTable> {
        let table: InvoiceTable = ocr_text.split('\n').filter_map(Self::extract_line).collect();
        debug!("Extracted {} invoice row(s)", table.len());
        (!table.is_empty()).then_some(table)
    }

    /// At most one row per line, labelled with the first vocabulary keyword
    /// the line contains. The amount is read from the line as written.
    pub fn extract_line(line: &str) -> Option<InvoiceRow> {
        let keyword = Keyword::find_in(line)?;
        let amount = parse_amount(line)?;
        trace!("{keyword}: '{}' -> {amount}", line.trim());
        Some(InvoiceRow::for_keyword(keyword, amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn csv(text: &str) -> Option<String> {
        Extractor::extract(text).map(|t| t.serialize())
    }

    #[test]
    fn spanish_invoice_scenario() {
        let text = "Base imponible 100,00\nIVA 21,00\nTotal 121,00";
        assert_eq!(
            csv(text).unwrap(),
            "Nombre,Monto\nBase,100.00\nIva,21.00\nTotal,121.00"
        );
    }

    #[test]
    fn keyword_case_does_not_matter() {
        for line in ["TOTAL: 1.234,56", "total: 1.234,56"] {
            let row = Extractor::extract_line(line).unwrap();
            assert_eq!(row, InvoiceRow::new("Total", "1234.56"), "line = {line}");
        }
    }

    #[test]
    fn us_dollar_amount_follows_literal_rule() {
        let row = Extractor::extract_line("Subtotal US$ 2,500.00").unwrap();
        assert_eq!(row, InvoiceRow::new("Subtotal", "2.50000"));
    }

    #[test]
    fn text_without_keywords_is_not_an_invoice() {
        assert_eq!(Extractor::extract("SUPERMERCADO LA PLAZA\nGracias por su visita\n12/03/2024"), None);
        assert_eq!(Extractor::extract(""), None);
    }

    #[test]
    fn keyword_without_amount_emits_nothing() {
        assert_eq!(Extractor::extract("Total a pagar\nIVA incluido"), None);
    }

    #[test]
    fn one_row_per_line_first_keyword_wins() {
        let table = Extractor::extract("Total IVA 12,10").unwrap();
        assert_eq!(table.rows(), &[InvoiceRow::new("Total", "12.10")]);

        let table = Extractor::extract("Subtotal 10,00").unwrap();
        assert_eq!(table.rows(), &[InvoiceRow::new("Subtotal", "10.00")]);
    }

    #[test]
    fn repeated_keywords_are_not_deduplicated() {
        let table = Extractor::extract("IVA 21% 10,50\nIVA 10% 2,00").unwrap();
        assert_eq!(
            table.rows(),
            &[InvoiceRow::new("Iva", "21"), InvoiceRow::new("Iva", "10")]
        );
    }

    #[test]
    fn carriage_returns_and_noise_lines() {
        let text = "FACTURA 0001-00012345\r\nFecha: 01/02/2024\r\nNeto € 1.500,00\r\nImpuesto 315,00\r\n";
        assert_eq!(
            csv(text).unwrap(),
            "Nombre,Monto\nNeto,1500.00\nImpuesto,315.00"
        );
    }

    #[test]
    fn ambiguous_single_group_is_kept_as_decimal() {
        let row = Extractor::extract_line("total 123,456").unwrap();
        assert_eq!(row.amount, "123.456");
    }

    #[test]
    fn amount_is_first_number_on_line() {
        // Digits inside the label are read before the amount.
        let row = Extractor::extract_line("Total 2 articulos 45,00").unwrap();
        assert_eq!(row.amount, "2");
    }
}
