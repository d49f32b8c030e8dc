//! Config command - manage configuration.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};

use factura_core::FacturaConfig;

use super::{default_config_path, load_config};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Write a configuration file with default values
    Init(InitArgs),

    /// Show the default configuration file path
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Output path for the configuration file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
}

pub fn run(args: ConfigArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let config = load_config(config_path)?;
            print!("{}", config.to_toml_string()?);
        }
        ConfigCommand::Init(init) => {
            let path = init.output.unwrap_or_else(default_config_path);
            init_config(&path, init.force)?;
            println!("Created configuration file at {}", path.display());
        }
        ConfigCommand::Path => println!("{}", default_config_path().display()),
    }
    Ok(())
}

fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }
    FacturaConfig::default().save(path)?;
    Ok(())
}
