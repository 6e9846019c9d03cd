//! StartDeck Web Server Binary
//!
//! This binary starts the StartDeck web server that provides a REST API
//! for the dashboard frontend.
//!
//! # Usage
//!
//! ```bash
//! # Start with the configured settings (port 3001, platform data directory)
//! startdeck-web
//!
//! # Specify port and database
//! startdeck-web --port 8080 --database ~/startdeck.db
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use startdeck::config::Config;
use startdeck::web;

/// StartDeck Web Server - REST API for the dashboard
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on (defaults to the configured port, 3001)
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to (defaults to the configured host, 127.0.0.1)
    #[arg(long)]
    host: Option<String>,

    /// SQLite database file.
    /// Defaults to the platform-specific data directory:
    /// - Linux: ~/.local/share/StartDeck/startdeck.db
    /// - macOS: ~/Library/Application Support/StartDeck/startdeck.db
    /// - Windows: %APPDATA%\StartDeck\startdeck.db
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration, falling back to defaults if the file is unusable
    let mut config = Config::load().unwrap_or_else(|err| {
        warn!("Ignoring config file: {err:#}");
        Config::default()
    });

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(database) = args.database {
        config.paths.database = Some(database);
    }

    info!("Database: {}", config.paths.database()?.display());

    // Build socket address
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    // Start the server
    web::run_server(config, addr).await
}
