use serde::{Deserialize, Serialize};
use std::fmt;

/// Financial keywords that anchor an invoice line, in matching priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Keyword {
    Base,
    Impuesto,
    Subtotal,
    Total,
    Iva,
    Neto,
}

impl Keyword {
    /// The vocabulary in priority order. `Subtotal` precedes `Total` so a
    /// subtotal line is never reported as a total.
    pub const ALL: [Keyword; 6] = [
        Keyword::Base,
        Keyword::Impuesto,
        Keyword::Subtotal,
        Keyword::Total,
        Keyword::Iva,
        Keyword::Neto,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Base => "base",
            Keyword::Impuesto => "impuesto",
            Keyword::Subtotal => "subtotal",
            Keyword::Total => "total",
            Keyword::Iva => "iva",
            Keyword::Neto => "neto",
        }
    }

    /// Row label: the keyword with its first letter upper-cased.
    pub fn label(self) -> String {
        capitalize(self.as_str())
    }

    /// First keyword (in priority order) contained in `line`, ignoring case
    /// and surrounding whitespace.
    pub fn find_in(line: &str) -> Option<Keyword> {
        let clean = line.trim().to_lowercase();
        Self::ALL.into_iter().find(|k| clean.contains(k.as_str()))
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Keyword {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == lower)
            .ok_or_else(|| format!("Unknown keyword: '{s}'"))
    }
}

/// Upper-case the first character and keep the rest untouched.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn labels_are_capitalized() {
        let labels: Vec<String> = Keyword::ALL.iter().map(|k| k.label()).collect();
        assert_eq!(labels, ["Base", "Impuesto", "Subtotal", "Total", "Iva", "Neto"]);
    }

    #[test]
    fn find_is_case_insensitive() {
        assert_eq!(Keyword::find_in("TOTAL: 1.234,56"), Some(Keyword::Total));
        assert_eq!(Keyword::find_in("  total: 1.234,56  "), Some(Keyword::Total));
    }

    #[test]
    fn find_matches_substrings() {
        assert_eq!(Keyword::find_in("Base imponible 100,00"), Some(Keyword::Base));
        assert_eq!(Keyword::find_in("Importe neto"), Some(Keyword::Neto));
    }

    #[test]
    fn find_prefers_vocabulary_order() {
        assert_eq!(Keyword::find_in("Subtotal 10,00"), Some(Keyword::Subtotal));
        assert_eq!(Keyword::find_in("Total IVA incluido 12,10"), Some(Keyword::Total));
        assert_eq!(Keyword::find_in("Neto + impuesto"), Some(Keyword::Impuesto));
    }

    #[test]
    fn find_none_for_unrelated_line() {
        assert_eq!(Keyword::find_in("Gracias por su compra"), None);
        assert_eq!(Keyword::find_in(""), None);
    }

    #[test]
    fn from_str_roundtrip() {
        for k in Keyword::ALL {
            assert_eq!(Keyword::from_str(&k.to_string()).unwrap(), k);
        }
        assert_eq!(Keyword::from_str("Iva").unwrap(), Keyword::Iva);
        assert!(Keyword::from_str("descuento").is_err());
    }

    #[test]
    fn capitalize_handles_edge_cases() {
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("iva"), "Iva");
        assert_eq!(capitalize("éxito"), "Éxito");
    }
}
