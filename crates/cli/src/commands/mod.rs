pub mod capture;
pub mod config;
pub mod export;
pub mod extract;
pub mod process;
pub mod watch;

use std::path::{Path, PathBuf};

use factura_core::FacturaConfig;

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("factura")
        .join("config.toml")
}

/// An explicit `--config` must exist; the default location is optional.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<FacturaConfig> {
    let config = match path {
        Some(p) => FacturaConfig::from_file(p)?,
        None => FacturaConfig::load_or_default(&default_config_path())?,
    };
    Ok(config)
}
