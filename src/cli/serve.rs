//! Runs the REST API server from the main binary.

use clap::Args;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::cli::common::{load_config, CliError, CliResult};
use crate::config::Config;
use crate::web;

/// Start the web server
#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Port to listen on (defaults to the configured port)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to (defaults to the configured host)
    #[arg(long)]
    pub host: Option<String>,

    /// SQLite database file (defaults to the configured database)
    #[arg(long, value_name = "FILE")]
    pub database: Option<PathBuf>,
}

impl ServeArgs {
    /// Applies command-line overrides to the loaded configuration.
    fn apply(&self, mut config: Config) -> Config {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = &self.host {
            config.server.host.clone_from(host);
        }
        if let Some(database) = &self.database {
            config.paths.database = Some(database.clone());
        }
        config
    }

    /// Execute the serve command
    pub fn execute(&self) -> CliResult<()> {
        let config = self.apply(load_config()?);

        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| CliError::validation(format!("Invalid listen address: {e}")))?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| CliError::io(format!("Failed to start runtime: {e}")))?;

        runtime
            .block_on(web::run_server(config, addr))
            .map_err(|e| CliError::io(format!("Server error: {e:#}")))
    }
}
