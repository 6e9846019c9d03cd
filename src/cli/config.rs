//! Config file commands: show the effective settings or write defaults.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::cli::common::{CliError, CliResult};
use crate::config::Config;

/// Manage the configuration file
#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show(ConfigFileArgs),
    /// Write a configuration file with default values
    Init {
        #[command(flatten)]
        file: ConfigFileArgs,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Which config file to use.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigFileArgs {
    /// Config file (defaults to the platform config location)
    #[arg(long, value_name = "FILE")]
    pub path: Option<PathBuf>,
}

impl ConfigFileArgs {
    fn resolve(&self) -> CliResult<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => Config::config_file_path()
                .map_err(|e| CliError::io(format!("Failed to resolve config path: {e:#}"))),
        }
    }
}

impl ConfigArgs {
    /// Execute the config command
    pub fn execute(&self) -> CliResult<()> {
        match &self.command {
            ConfigCommand::Show(file) => show(file),
            ConfigCommand::Init { file, force } => init(file, *force),
        }
    }
}

fn show(file: &ConfigFileArgs) -> CliResult<()> {
    let path = file.resolve()?;
    let config = Config::load_from(&path)
        .map_err(|e| CliError::validation(format!("Invalid config: {e:#}")))?;
    let content = toml::to_string_pretty(&config)
        .map_err(|e| CliError::io(format!("Failed to serialize configuration: {e}")))?;
    print!("{content}");
    Ok(())
}

fn init(file: &ConfigFileArgs, force: bool) -> CliResult<()> {
    let path = file.resolve()?;
    if path.exists() && !force {
        return Err(CliError::validation(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    let config = Config::default();
    let written = match &file.path {
        Some(path) => config.save_to(path),
        None => config.save(),
    };
    written.map_err(|e| CliError::io(format!("{e:#}")))?;

    println!("Wrote {}", path.display());
    Ok(())
}
