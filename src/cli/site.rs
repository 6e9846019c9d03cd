//! Site management commands.

use clap::{Args, Subcommand};

use crate::cli::common::{CliError, CliResult, StoreArgs};
use crate::icons::IconLibrary;
use crate::models::{IconSource, RgbColor, Site, SiteId};

/// Manage sites
#[derive(Debug, Clone, Args)]
pub struct SiteArgs {
    /// Site subcommand
    #[command(subcommand)]
    pub command: SiteCommand,
}

/// Site management subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum SiteCommand {
    /// Add a site, or replace the site with the same id
    Add(AddSiteArgs),
    /// Delete a site
    Delete(DeleteSiteArgs),
    /// Move a site into another site's position
    Move(MoveSiteArgs),
}

/// Add or replace a site
#[derive(Debug, Clone, Args)]
pub struct AddSiteArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Card title
    #[arg(long)]
    pub name: String,

    /// Target URL
    #[arg(long)]
    pub url: String,

    /// Category the site belongs to (must exist)
    #[arg(short, long, value_name = "NAME")]
    pub category: String,

    /// Description shown under the title
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Brand color (#RRGGBB)
    #[arg(long, value_name = "HEX")]
    pub color: Option<String>,

    /// Use a built-in library icon instead of the favicon
    #[arg(long, value_name = "KEY")]
    pub icon: Option<String>,

    /// Explicit id; replaces the existing site with this id
    #[arg(long)]
    pub id: Option<String>,
}

/// Delete a site
#[derive(Debug, Clone, Args)]
pub struct DeleteSiteArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Site id
    #[arg(value_name = "ID")]
    pub id: String,
}

/// Move a site
#[derive(Debug, Clone, Args)]
pub struct MoveSiteArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Site to move
    #[arg(value_name = "ID")]
    pub id: String,

    /// Site whose position it takes
    #[arg(long, value_name = "ID")]
    pub to: String,
}

impl SiteArgs {
    /// Execute the site command
    pub fn execute(&self) -> CliResult<()> {
        match &self.command {
            SiteCommand::Add(args) => args.execute(),
            SiteCommand::Delete(args) => args.execute(),
            SiteCommand::Move(args) => args.execute(),
        }
    }
}

impl AddSiteArgs {
    fn build_site(&self) -> CliResult<Site> {
        let mut site = Site::new(&self.name, &self.url, &self.category)
            .with_description(&self.description);

        if let Some(id) = &self.id {
            site = site.with_id(id.as_str());
        }

        if let Some(hex) = &self.color {
            let color = RgbColor::from_hex(hex)
                .map_err(|e| CliError::validation(format!("Invalid color '{hex}': {e}")))?;
            site = site.with_color(color);
        }

        if let Some(key) = &self.icon {
            let library = IconLibrary::load()
                .map_err(|e| CliError::io(format!("Failed to load icon library: {e}")))?;
            let icon = library
                .get(key)
                .ok_or_else(|| CliError::validation(format!("Unknown library icon '{key}'")))?;
            site = site.with_icon(IconSource::Library {
                key: icon.key.clone(),
            });
        }

        if site.hostname().is_none() {
            return Err(CliError::validation(format!("Invalid URL '{}'", self.url)));
        }

        Ok(site)
    }

    /// Execute the add command
    pub fn execute(&self) -> CliResult<()> {
        let site = self.build_site()?;
        let id = site.id.clone();

        let mut session = self.store.open_session()?;
        let replaced = session.apply(|store| store.upsert_site(site))?;

        if replaced {
            println!("Site '{id}' updated.");
        } else {
            println!("Site '{id}' added.");
        }
        Ok(())
    }
}

impl DeleteSiteArgs {
    /// Execute the delete command
    pub fn execute(&self) -> CliResult<()> {
        let id = SiteId::new(self.id.as_str());
        let mut session = self.store.open_session()?;
        let removed = session.apply(|store| store.delete_site(&id))?;

        println!("Site '{}' ({}) deleted.", removed.name, removed.id);
        Ok(())
    }
}

impl MoveSiteArgs {
    /// Execute the move command
    pub fn execute(&self) -> CliResult<()> {
        let source = SiteId::new(self.id.as_str());
        let target = SiteId::new(self.to.as_str());

        let mut session = self.store.open_session()?;
        for id in [&source, &target] {
            if session.store().site(id).is_none() {
                return Err(CliError::validation(format!("Site '{id}' not found")));
            }
        }

        let moved = session.apply(|store| Ok(store.reorder_sites(&source, &target)))?;
        if moved {
            println!("Site '{source}' moved.");
        } else {
            println!("Site '{source}' already in place.");
        }
        Ok(())
    }
}
