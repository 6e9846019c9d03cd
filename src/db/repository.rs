//! SQLite repository: identity-keyed upserts, cascading deletes and the
//! server side of catalog imports.

use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

use super::migrations;
use crate::error::{CatalogError, Result};
use crate::models::{
    merge_fields, AppConfig, CatalogSnapshot, Category, CategoryColorAssigner, CustomFont,
    IconSource, LayoutSettings, RgbColor, Site, SiteId, TrackedField,
};
use crate::services::import::{ImportPayload, ImportReport};
use crate::services::persistence::PersistenceBridge;

const SITE_COLUMNS: &str = "id, name, url, description, category, color, icon, sort_order, hidden";

/// A category row with the attributes stored alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRow {
    /// Name and order.
    pub category: Category,
    /// Assigned color, if any.
    pub color: Option<RgbColor>,
    /// Whether the category is hidden.
    pub hidden: bool,
}

/// Owner of the SQLite connection.
#[derive(Debug)]
pub struct Repository {
    conn: Connection,
}

impl Repository {
    /// Opens (creating if needed) the database at `path` and migrates it.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Self::from_connection(conn)
    }

    /// Opens a private in-memory database (tests, dry runs).
    pub fn open_in_memory() -> anyhow::Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        migrations::run_migrations(&conn).context("Failed to migrate database")?;
        Ok(Self { conn })
    }

    /// Current schema version.
    pub fn schema_version(&self) -> anyhow::Result<u32> {
        migrations::schema_version(&self.conn)
    }

    // ------------------------------------------------------------------
    // Sites
    // ------------------------------------------------------------------

    /// All sites in display order.
    pub fn list_sites(&self) -> Result<Vec<Site>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SITE_COLUMNS} FROM sites ORDER BY sort_order, rowid"
        ))?;
        let rows = stmt
            .query_map([], read_site_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(SiteRow::into_site).collect()
    }

    /// One site by id.
    pub fn get_site(&self, id: &SiteId) -> Result<Option<Site>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {SITE_COLUMNS} FROM sites WHERE id = ?1"),
                [id.as_str()],
                read_site_row,
            )
            .optional()?;
        row.map(SiteRow::into_site).transpose()
    }

    /// Creates or overwrites a site by id.
    ///
    /// The category must exist.
    pub fn upsert_site(&self, site: &Site) -> Result<()> {
        if !category_exists(&self.conn, &site.category)? {
            return Err(CatalogError::UnknownCategory(site.category.clone()));
        }
        upsert_site(&self.conn, site)
    }

    /// Order value that appends a new site at the end.
    pub fn next_site_order(&self) -> Result<i64> {
        next_order(&self.conn, "sites")
    }

    /// Deletes one site; `false` if it did not exist.
    pub fn delete_site(&self, id: &SiteId) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM sites WHERE id = ?1", [id.as_str()])?;
        Ok(deleted > 0)
    }

    // ------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------

    /// All categories in display order, with color and visibility.
    pub fn list_categories(&self) -> Result<Vec<CategoryRow>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, sort_order, color, hidden FROM categories ORDER BY sort_order, id")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, bool>(3)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .map(|(name, order, color, hidden)| CategoryRow {
                category: Category { name, order },
                color: color.and_then(|hex| RgbColor::from_hex(&hex).ok()),
                hidden,
            })
            .collect())
    }

    /// Creates or updates a category by name.
    ///
    /// `None` leaves the stored color or visibility as it is.
    pub fn upsert_category(
        &self,
        category: &Category,
        color: Option<RgbColor>,
        hidden: Option<bool>,
    ) -> Result<()> {
        upsert_category(&self.conn, category, color, hidden)
    }

    /// Order value that appends a new category at the end.
    pub fn next_category_order(&self) -> Result<i64> {
        next_order(&self.conn, "categories")
    }

    /// Deletes one category row, leaving its sites in place.
    pub fn delete_category(&self, name: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM categories WHERE name = ?1", [name])?;
        Ok(deleted > 0)
    }

    /// Deletes a category and all its sites in one transaction.
    ///
    /// Returns the number of sites deleted. Nothing is deleted if the
    /// category does not exist.
    pub fn delete_category_cascade(&mut self, name: &str) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let removed_sites = tx.execute("DELETE FROM sites WHERE category = ?1", [name])?;
        let deleted = tx.execute("DELETE FROM categories WHERE name = ?1", [name])?;
        if deleted == 0 {
            return Err(CatalogError::CategoryNotFound(name.to_string()));
        }
        tx.commit()?;

        info!(category = %name, removed_sites, "Deleted category with its sites");
        Ok(removed_sites)
    }

    // ------------------------------------------------------------------
    // Settings, fonts, icon cache
    // ------------------------------------------------------------------

    /// Stored custom fonts.
    pub fn list_fonts(&self) -> Result<Vec<CustomFont>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, family, url FROM custom_fonts ORDER BY rowid")?;
        let fonts = stmt
            .query_map([], |row| {
                Ok(CustomFont {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    family: row.get(2)?,
                    url: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(fonts)
    }

    /// Creates or overwrites a custom font by id.
    pub fn upsert_font(&self, font: &CustomFont) -> Result<()> {
        upsert_font(&self.conn, font)
    }

    /// Records the cached favicon asset of a hostname.
    pub fn record_icon(&self, hostname: &str, asset: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO icon_cache (hostname, asset, fetched_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(hostname) DO UPDATE SET asset = excluded.asset, fetched_at = excluded.fetched_at",
            params![hostname, asset, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Cached favicon asset of a hostname.
    pub fn icon_for(&self, hostname: &str) -> Result<Option<String>> {
        let asset = self
            .conn
            .query_row(
                "SELECT asset FROM icon_cache WHERE hostname = ?1",
                [hostname],
                |row| row.get(0),
            )
            .optional()?;
        Ok(asset)
    }

    // ------------------------------------------------------------------
    // Whole-catalog operations
    // ------------------------------------------------------------------

    /// Reads the whole catalog.
    ///
    /// Unreadable settings values are logged and left out.
    pub fn load_snapshot(&self) -> Result<CatalogSnapshot> {
        let rows = self.list_categories()?;
        let category_colors: BTreeMap<String, RgbColor> = rows
            .iter()
            .filter_map(|row| row.color.map(|color| (row.category.name.clone(), color)))
            .collect();
        let hidden_categories = rows
            .iter()
            .filter(|row| row.hidden)
            .map(|row| row.category.name.clone())
            .collect();

        Ok(CatalogSnapshot {
            sites: Some(self.list_sites()?),
            categories: Some(rows.into_iter().map(|row| row.category).collect()),
            category_colors: Some(category_colors),
            hidden_categories: Some(hidden_categories),
            layout: get_setting(&self.conn, TrackedField::Layout)?,
            config: get_setting(&self.conn, TrackedField::Config)?,
            theme: get_setting(&self.conn, TrackedField::Theme)?,
            custom_fonts: Some(self.list_fonts()?),
        })
    }

    /// Upserts a validated import in one transaction.
    ///
    /// Sites are upserted by id, categories by name and fonts by id. Each
    /// font gets its own savepoint: a font the database rejects is skipped
    /// and reported, the rest of the batch still commits. Categories
    /// referenced by sites but missing are created, and categories without
    /// a color get one from the palette.
    pub fn import(&mut self, payload: &ImportPayload) -> Result<ImportReport> {
        let mut tx = self.conn.transaction()?;
        let mut skipped_fonts = payload.skipped_fonts.clone();

        if let Some(categories) = &payload.categories {
            for category in positioned(categories) {
                upsert_category(&tx, &category, None, None)?;
            }
        }

        if let Some(sites) = &payload.sites {
            for site in sites {
                if !category_exists(&tx, &site.category)? {
                    let category = Category {
                        name: Category::validate_name(&site.category)?,
                        order: next_order(&tx, "categories")?,
                    };
                    debug!(category = %category.name, "Creating category referenced by import");
                    upsert_category(&tx, &category, None, None)?;
                }
                upsert_site(&tx, site)?;
            }
        }

        if let Some(colors) = &payload.category_colors {
            for (name, color) in colors {
                tx.execute(
                    "UPDATE categories SET color = ?2 WHERE name = ?1",
                    params![name, color.to_hex()],
                )?;
            }
        }

        if let Some(hidden) = &payload.hidden_categories {
            write_hidden(&tx, hidden)?;
        }

        if let Some(patch) = &payload.layout {
            let current: LayoutSettings = get_setting(&tx, TrackedField::Layout)?.unwrap_or_default();
            let merged = merge_fields(&current, patch)?;
            set_setting(&tx, TrackedField::Layout, &serde_json::to_value(merged)?)?;
        }

        if let Some(patch) = &payload.config {
            let current: AppConfig = get_setting(&tx, TrackedField::Config)?.unwrap_or_default();
            let merged = merge_fields(&current, patch)?;
            set_setting(&tx, TrackedField::Config, &serde_json::to_value(merged)?)?;
        }

        if let Some(theme) = payload.theme {
            set_setting(&tx, TrackedField::Theme, &serde_json::to_value(theme)?)?;
        }

        if let Some(fonts) = &payload.custom_fonts {
            for font in fonts {
                let savepoint = tx.savepoint()?;
                match upsert_font(&savepoint, font) {
                    Ok(()) => savepoint.commit()?,
                    Err(err) => {
                        warn!(font = %font.id, error = %err, "Skipping custom font");
                        skipped_fonts.push(font.id.clone());
                    }
                }
            }
        }

        ensure_category_colors(&tx)?;
        tx.commit()?;

        let applied = payload.fields();
        info!(fields = applied.len(), skipped = skipped_fonts.len(), "Imported snapshot");
        Ok(ImportReport {
            applied,
            skipped_fonts,
        })
    }

    /// Replaces one persisted field in full.
    pub fn write_field(&mut self, field: TrackedField, value: &Value) -> Result<()> {
        let tx = self.conn.transaction()?;

        match field {
            TrackedField::Sites => {
                let sites: Vec<Site> = serde_json::from_value(value.clone())?;
                tx.execute("DELETE FROM sites", [])?;
                for site in &sites {
                    upsert_site(&tx, site)?;
                }
            }
            TrackedField::Categories => {
                let categories: Vec<Category> = serde_json::from_value(value.clone())?;
                let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
                let existing: Vec<String> = tx
                    .prepare("SELECT name FROM categories")?
                    .query_map([], |row| row.get(0))?
                    .collect::<std::result::Result<_, _>>()?;
                for name in existing.iter().filter(|name| !names.contains(&name.as_str())) {
                    tx.execute("DELETE FROM categories WHERE name = ?1", [name])?;
                }
                for category in &categories {
                    upsert_category(&tx, category, None, None)?;
                }
            }
            TrackedField::CategoryColors => {
                let colors: BTreeMap<String, RgbColor> = serde_json::from_value(value.clone())?;
                tx.execute("UPDATE categories SET color = NULL", [])?;
                for (name, color) in &colors {
                    tx.execute(
                        "UPDATE categories SET color = ?2 WHERE name = ?1",
                        params![name, color.to_hex()],
                    )?;
                }
            }
            TrackedField::HiddenCategories => {
                let hidden: Vec<String> = serde_json::from_value(value.clone())?;
                write_hidden(&tx, &hidden)?;
            }
            TrackedField::Layout | TrackedField::Config | TrackedField::Theme => {
                set_setting(&tx, field, value)?;
            }
            TrackedField::CustomFonts => {
                let fonts: Vec<CustomFont> = serde_json::from_value(value.clone())?;
                tx.execute("DELETE FROM custom_fonts", [])?;
                for font in &fonts {
                    upsert_font(&tx, font)?;
                }
            }
        }

        tx.commit()?;
        debug!(%field, "Wrote catalog field to database");
        Ok(())
    }
}

impl PersistenceBridge for Repository {
    fn load(&mut self) -> anyhow::Result<CatalogSnapshot> {
        Ok(self.load_snapshot()?)
    }

    fn write(&mut self, field: TrackedField, value: &Value) -> anyhow::Result<()> {
        Ok(self.write_field(field, value)?)
    }
}

// ----------------------------------------------------------------------
// Statement helpers, shared by the connection and transactions
// ----------------------------------------------------------------------

struct SiteRow {
    id: String,
    name: String,
    url: String,
    description: String,
    category: String,
    color: String,
    icon: String,
    order: i64,
    hidden: bool,
}

impl SiteRow {
    fn into_site(self) -> Result<Site> {
        let icon: IconSource = serde_json::from_str(&self.icon)?;
        let color = RgbColor::from_hex(&self.color).unwrap_or_else(|_| {
            warn!(site = %self.id, color = %self.color, "Invalid stored site color");
            RgbColor::default()
        });

        Ok(Site {
            id: SiteId::new(self.id),
            name: self.name,
            url: self.url,
            description: self.description,
            category: self.category,
            color,
            icon,
            order: self.order,
            hidden: self.hidden,
        })
    }
}

fn read_site_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SiteRow> {
    Ok(SiteRow {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        description: row.get(3)?,
        category: row.get(4)?,
        color: row.get(5)?,
        icon: row.get(6)?,
        order: row.get(7)?,
        hidden: row.get(8)?,
    })
}

fn upsert_site(conn: &Connection, site: &Site) -> Result<()> {
    let icon = serde_json::to_string(&site.icon)?;
    conn.execute(
        "INSERT INTO sites (id, name, url, description, category, color, icon, sort_order, hidden)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(id) DO UPDATE SET
             name = excluded.name,
             url = excluded.url,
             description = excluded.description,
             category = excluded.category,
             color = excluded.color,
             icon = excluded.icon,
             sort_order = excluded.sort_order,
             hidden = excluded.hidden",
        params![
            site.id.as_str(),
            site.name,
            site.url,
            site.description,
            site.category,
            site.color.to_hex(),
            icon,
            site.order,
            site.hidden,
        ],
    )?;
    Ok(())
}

fn upsert_category(
    conn: &Connection,
    category: &Category,
    color: Option<RgbColor>,
    hidden: Option<bool>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO categories (name, sort_order, color, hidden)
         VALUES (?1, ?2, ?3, COALESCE(?4, 0))
         ON CONFLICT(name) DO UPDATE SET
             sort_order = excluded.sort_order,
             color = COALESCE(?3, categories.color),
             hidden = COALESCE(?4, categories.hidden)",
        params![
            category.name,
            category.order,
            color.map(|c| c.to_hex()),
            hidden,
        ],
    )?;
    Ok(())
}

/// Imported categories in display order, numbered by position.
///
/// Bare names carry no order, so a stable sort keeps their array order.
/// Duplicate names keep the first occurrence.
fn positioned(categories: &[Category]) -> Vec<Category> {
    let mut sorted: Vec<&Category> = categories.iter().collect();
    sorted.sort_by_key(|category| category.order);

    let mut seen = std::collections::HashSet::new();
    sorted
        .into_iter()
        .filter(|category| seen.insert(category.name.as_str()))
        .enumerate()
        .map(|(index, category)| Category {
            name: category.name.clone(),
            order: index as i64,
        })
        .collect()
}

fn upsert_font(conn: &Connection, font: &CustomFont) -> Result<()> {
    conn.execute(
        "INSERT INTO custom_fonts (id, name, family, url) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
             name = excluded.name,
             family = excluded.family,
             url = excluded.url",
        params![font.id, font.name, font.family, font.url],
    )?;
    Ok(())
}

fn category_exists(conn: &Connection, name: &str) -> Result<bool> {
    let found = conn
        .query_row("SELECT 1 FROM categories WHERE name = ?1", [name], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

fn next_order(conn: &Connection, table: &str) -> Result<i64> {
    let max: Option<i64> =
        conn.query_row(&format!("SELECT MAX(sort_order) FROM {table}"), [], |row| row.get(0))?;
    Ok(max.map_or(0, |max| max + 1))
}

fn write_hidden(conn: &Connection, hidden: &[String]) -> Result<()> {
    conn.execute("UPDATE categories SET hidden = 0", [])?;
    for name in hidden {
        conn.execute("UPDATE categories SET hidden = 1 WHERE name = ?1", [name])?;
    }
    Ok(())
}

fn ensure_category_colors(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare("SELECT name, sort_order, color FROM categories ORDER BY sort_order, id")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let categories: Vec<Category> = rows
        .iter()
        .map(|(name, order, _)| Category {
            name: name.clone(),
            order: *order,
        })
        .collect();
    let existing: BTreeMap<String, RgbColor> = rows
        .iter()
        .filter_map(|(name, _, color)| {
            let color = RgbColor::from_hex(color.as_deref()?).ok()?;
            Some((name.clone(), color))
        })
        .collect();

    let assigned = CategoryColorAssigner::default().ensure_colors(&categories, &existing);
    for (name, color) in assigned.iter().filter(|(name, _)| !existing.contains_key(*name)) {
        conn.execute(
            "UPDATE categories SET color = ?2 WHERE name = ?1",
            params![name, color.to_hex()],
        )?;
    }
    Ok(())
}

fn set_setting(conn: &Connection, field: TrackedField, value: &Value) -> Result<()> {
    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![field.key(), value.to_string()],
    )?;
    Ok(())
}

fn get_setting<T: DeserializeOwned>(conn: &Connection, field: TrackedField) -> Result<Option<T>> {
    let raw: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key = ?1", [field.key()], |row| row.get(0))
        .optional()?;

    Ok(raw.and_then(|raw| match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(%field, error = %err, "Ignoring unreadable stored setting");
            None
        }
    }))
}
