//! CLI command handlers for StartDeck.
//!
//! Every command opens the client-local catalog store, performs one
//! operation through a [`CatalogSession`](crate::services::CatalogSession)
//! and exits. Failures map to [`ExitCode`]s.

pub mod catalog;
pub mod category;
pub mod common;
pub mod config;
#[cfg(feature = "web")]
pub mod serve;
pub mod site;

// Re-export types used by main.rs and tests
pub use catalog::{ExportArgs, ImportArgs, ListArgs};
pub use category::CategoryArgs;
pub use common::{CliError, CliResult, ExitCode, StoreArgs};
pub use config::ConfigArgs;
#[cfg(feature = "web")]
pub use serve::ServeArgs;
pub use site::SiteArgs;
