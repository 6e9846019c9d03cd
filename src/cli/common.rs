//! Shared plumbing for CLI commands: exit codes, errors and store access.

use clap::Args;
use std::fmt;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::CatalogError;
use crate::services::persistence::{CatalogSession, LocalStore};

/// Process exit codes used by every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Command succeeded
    Success = 0,
    /// Input was rejected (bad arguments, unknown records, invalid import)
    ValidationError = 1,
    /// Reading or writing the store failed
    IoError = 2,
}

/// A failed CLI command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliError {
    /// Message printed to stderr
    pub message: String,
    /// Exit code to terminate with
    pub exit_code: ExitCode,
}

impl CliError {
    /// Input was rejected.
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit_code: ExitCode::ValidationError,
        }
    }

    /// Storage failed.
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit_code: ExitCode::IoError,
        }
    }

    /// Numeric process exit code.
    pub fn code(&self) -> i32 {
        self.exit_code as i32
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<CatalogError> for CliError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::UnknownCategory(_)
            | CatalogError::CategoryNotFound(_)
            | CatalogError::SiteNotFound(_)
            | CatalogError::InvalidCategoryName { .. }
            | CatalogError::InvalidSnapshot(_) => Self::validation(err.to_string()),
            CatalogError::Database(_)
            | CatalogError::Io(_)
            | CatalogError::Json(_)
            | CatalogError::CascadeIncomplete { .. }
            | CatalogError::Other(_) => Self::io(err.to_string()),
        }
    }
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Location of the client-local catalog store.
#[derive(Debug, Clone, Default, Args)]
pub struct StoreArgs {
    /// Catalog data directory (defaults to the configured data directory)
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

impl StoreArgs {
    /// Resolves the data directory: flag, then config file, then platform default.
    pub fn resolve_dir(&self) -> CliResult<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }

        load_config()?
            .paths
            .data_dir()
            .map_err(|e| CliError::io(format!("Failed to resolve data directory: {e:#}")))
    }

    /// Opens the catalog stored in the data directory.
    pub fn open_session(&self) -> CliResult<CatalogSession<LocalStore>> {
        let dir = self.resolve_dir()?;
        let store = LocalStore::open(&dir).map_err(|e| CliError::io(format!("{e:#}")))?;
        CatalogSession::open(store)
            .map_err(|e| CliError::io(format!("Failed to open catalog: {e:#}")))
    }
}

/// Loads the user's config file, or defaults when there is none.
pub fn load_config() -> CliResult<Config> {
    Config::load().map_err(|e| CliError::io(format!("Failed to load config: {e:#}")))
}

/// Prints `value` as a single JSON line.
pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string(value)
        .map_err(|e| CliError::io(format!("Failed to serialize JSON: {e}")))?;
    println!("{json}");
    Ok(())
}
