//! StartDeck - personal start page and bookmark dashboard
//!
//! This binary manages the local catalog from the command line and can
//! start the REST API server the dashboard frontend talks to.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "web")]
use startdeck::cli::ServeArgs;
use startdeck::cli::{
    CategoryArgs, CliResult, ConfigArgs, ExportArgs, ImportArgs, ListArgs, SiteArgs,
};
use startdeck::constants::APP_NAME;

/// StartDeck - personal start page and bookmark dashboard
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the REST API server
    #[cfg(feature = "web")]
    Serve(ServeArgs),
    /// List sites, grouped by category
    List(ListArgs),
    /// Import a catalog backup
    Import(ImportArgs),
    /// Export the catalog as a backup
    Export(ExportArgs),
    /// Manage sites
    Site(SiteArgs),
    /// Manage categories
    Category(CategoryArgs),
    /// Show or initialize the configuration file
    Config(ConfigArgs),
}

impl Commands {
    fn execute(&self) -> CliResult<()> {
        match self {
            #[cfg(feature = "web")]
            Self::Serve(args) => args.execute(),
            Self::List(args) => args.execute(),
            Self::Import(args) => args.execute(),
            Self::Export(args) => args.execute(),
            Self::Site(args) => args.execute(),
            Self::Category(args) => args.execute(),
            Self::Config(args) => args.execute(),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output on stdout stays parseable
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = cli.command.execute() {
        eprintln!("{APP_NAME}: {err}");
        std::process::exit(err.code());
    }
}
