pub mod amount;
pub mod config;
pub mod keyword;
pub mod table;

pub use amount::{normalize_amount, parse_amount, scan_amount, AmountSpan};
pub use config::{ConfigError, ExportConfig, FacturaConfig, ImageConfig, RecognitionConfig};
pub use keyword::{capitalize, Keyword};
pub use table::{InvoiceRow, InvoiceTable, TableError, EXPORT_FILE_NAME, HEADER};
