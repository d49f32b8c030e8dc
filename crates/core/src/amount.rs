//! Amount scanning and normalization for invoice lines.
//!
//! The scanner is a small hand-written grammar applied from the first ASCII
//! digit of a line:
//!
//! ```text
//! amount   := lead group* fraction?
//! lead     := DIGIT{1,3}
//! group    := SEP DIGIT{3}
//! fraction := SEP DIGIT{2}
//! SEP      := '.' | ','
//! ```
//!
//! Each production is greedy and nothing after the amount is inspected, so
//! `"12345"` scans as `"123"` and `"1,2345"` as `"1,234"`. A leading currency
//! marker (`US$ `, `€`, ...) may precede the amount but is never part of it.
//!
//! Normalization always treats `.` as a thousands separator and only the
//! first `,` as the decimal point. `"123,456"` therefore becomes `"123.456"`;
//! this locale ambiguity is deliberately left as is.

use std::sync::OnceLock;

use regex::Regex;

/// Currency symbols removed from a normalized amount.
pub const CURRENCY_SYMBOLS: [&str; 7] = ["US$", "$", "€", "¥", "₡", "₱", "₹"];

fn re_currency() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| {
        let alternatives: Vec<String> = CURRENCY_SYMBOLS.iter().map(|s| regex::escape(s)).collect();
        Regex::new(&format!(r"(?i)\s?(?:{})", alternatives.join("|"))).expect("invalid regex")
    })
}

/// A raw amount located inside a line, before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountSpan<'a> {
    pub text: &'a str,
    /// Byte offset of `text` within the scanned line.
    pub start: usize,
}

impl AmountSpan<'_> {
    pub fn normalized(&self) -> String {
        normalize_amount(self.text)
    }
}

/// Locate the raw amount in `line`. Returns `None` when the line has no digit.
pub fn scan_amount(line: &str) -> Option<AmountSpan<'_>> {
    let bytes = line.as_bytes();
    let start = bytes.iter().position(u8::is_ascii_digit)?;

    let mut end = start + leading_digits(&bytes[start..]);
    while let Some(next) = separated_digits(bytes, end, 3) {
        end = next;
    }
    if let Some(next) = separated_digits(bytes, end, 2) {
        end = next;
    }

    // Only ASCII bytes were consumed, so both offsets sit on char boundaries.
    Some(AmountSpan { text: &line[start..end], start })
}

/// `DIGIT{1,3}`: the caller guarantees `bytes[0]` is a digit.
fn leading_digits(bytes: &[u8]) -> usize {
    bytes.iter().take(3).take_while(|b| b.is_ascii_digit()).count()
}

/// `SEP DIGIT{n}` starting at `at`. Returns the offset just past the match.
fn separated_digits(bytes: &[u8], at: usize, n: usize) -> Option<usize> {
    let sep = *bytes.get(at)?;
    if sep != b'.' && sep != b',' {
        return None;
    }
    let digits = bytes.get(at + 1..at + 1 + n)?;
    digits.iter().all(u8::is_ascii_digit).then_some(at + 1 + n)
}

/// Canonicalize a raw amount: drop every `.`, turn the first `,` into `.`,
/// strip currency symbols and surrounding whitespace.
pub fn normalize_amount(raw: &str) -> String {
    let without_groups = raw.replace('.', "");
    let with_point = without_groups.replacen(',', ".", 1);
    re_currency().replace_all(&with_point, "").trim().to_string()
}

/// Scan `line` and normalize the first amount found.
pub fn parse_amount(line: &str) -> Option<String> {
    scan_amount(line).map(|span| span.normalized())
}
