//! Whole-catalog commands: list, import and export.

use clap::Args;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::catalog::external_search_url;
use crate::cli::common::{load_config, print_json, CliError, CliResult, StoreArgs};
use crate::constants::{ALL_CATEGORY, LOCAL_SEARCH_ENGINE};
use crate::icons::{Glyph, IconCursorTable, IconResolver};
use crate::models::{Site, SiteId};
use crate::services::import::ImportReconciler;

/// List sites, grouped by category
#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Only show sites in this category
    #[arg(short, long, value_name = "NAME")]
    pub category: Option<String>,

    /// Filter by name or description (case-insensitive)
    #[arg(short, long, value_name = "TEXT")]
    pub query: Option<String>,

    /// Search engine; anything other than "local" prints the search URL instead
    #[arg(long, value_name = "ID", default_value = LOCAL_SEARCH_ENGINE)]
    pub engine: String,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ListResponse<'a> {
    tabs: Vec<&'a str>,
    sites: Vec<&'a Site>,
    glyphs: BTreeMap<&'a SiteId, Glyph>,
    count: usize,
}

impl ListArgs {
    /// Execute the list command
    pub fn execute(&self) -> CliResult<()> {
        let session = self.store.open_session()?;
        let store = session.store();
        let query = self.query.as_deref().unwrap_or("");

        if let Some(url) = external_search_url(&self.engine, query) {
            println!("{url}");
            return Ok(());
        }

        let tab = self.category.as_deref().unwrap_or(ALL_CATEGORY);
        if tab != ALL_CATEGORY && !store.has_category(tab) {
            return Err(CliError::validation(format!("Category '{tab}' not found")));
        }

        let sites = store.filtered_sites(tab, query, &self.engine);

        if self.json {
            let resolver = IconResolver::new(load_config()?.icons.providers);
            let mut cursors = IconCursorTable::new();
            let glyphs = sites
                .iter()
                .map(|&site| (&site.id, resolver.resolve(site, &mut cursors)))
                .collect();

            return print_json(&ListResponse {
                tabs: store.tabs(),
                count: sites.len(),
                glyphs,
                sites,
            });
        }

        if sites.is_empty() {
            println!("No sites found.");
            return Ok(());
        }

        if tab == ALL_CATEGORY {
            for group in store.grouped_sites(query, &self.engine) {
                println!("{} ({})", group.category, group.color);
                for site in group.sites {
                    println!("  {:<24} {:<40} {}", site.name, site.url, site.id);
                }
            }
        } else {
            println!("{tab}:");
            for site in sites {
                println!("  {:<24} {:<40} {}", site.name, site.url, site.id);
            }
        }

        Ok(())
    }
}

/// Import a catalog backup (full or partial)
#[derive(Debug, Clone, Args)]
pub struct ImportArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Backup file to import
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Output the import report as JSON
    #[arg(long)]
    pub json: bool,
}

impl ImportArgs {
    /// Execute the import command
    pub fn execute(&self) -> CliResult<()> {
        let content = fs::read_to_string(&self.file).map_err(|e| {
            CliError::io(format!("Failed to read {}: {e}", self.file.display()))
        })?;

        // Validate before opening the store so a bad file leaves it untouched
        let payload = ImportReconciler::parse_str(&content)
            .map_err(|e| CliError::validation(format!("Invalid import: {e}")))?;

        let mut session = self.store.open_session()?;
        let report = session.import(payload)?;

        if self.json {
            return print_json(&report);
        }

        let applied: Vec<&str> = report.applied.iter().map(|field| field.key()).collect();
        println!("Imported: {}", applied.join(", "));
        if !report.skipped_fonts.is_empty() {
            println!("Skipped fonts: {}", report.skipped_fonts.join(", "));
        }
        Ok(())
    }
}

/// Export the catalog as a backup file
#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl ExportArgs {
    /// Execute the export command
    pub fn execute(&self) -> CliResult<()> {
        let session = self.store.open_session()?;
        let json = serde_json::to_string_pretty(&session.store().snapshot())
            .map_err(|e| CliError::io(format!("Failed to serialize catalog: {e}")))?;

        match &self.output {
            Some(path) => {
                fs::write(path, json)
                    .map_err(|e| CliError::io(format!("Failed to write {}: {e}", path.display())))?;
                eprintln!("Catalog exported to {}", path.display());
            }
            None => println!("{json}"),
        }
        Ok(())
    }
}
