//! Mirroring the catalog to durable storage.
//!
//! [`PersistenceBridge`] is the narrow contract between the in-memory
//! [`CatalogStore`] and whatever keeps it across restarts. Storage is
//! field-oriented: hydration reads every [`TrackedField`] independently, and
//! a flush writes each dirty field back in full (last write wins).
//!
//! Two bridges exist: [`LocalStore`] (one JSON file per field in a data
//! directory, used by the CLI) and the relational
//! [`Repository`](crate::db::Repository) used by the server.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::catalog::CatalogStore;
use crate::error::CatalogError;
use crate::models::{CatalogSnapshot, Site, TrackedField};
use crate::services::import::{ImportPayload, ImportReconciler, ImportReport};

/// Durable storage for catalog fields.
pub trait PersistenceBridge {
    /// Reads every stored field. Missing or unreadable fields are `None`.
    fn load(&mut self) -> Result<CatalogSnapshot>;

    /// Replaces one stored field with `value`.
    fn write(&mut self, field: TrackedField, value: &Value) -> Result<()>;
}

/// Client-local store: `<dir>/<field>.json` per tracked field.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    /// Opens (and creates if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// The data directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `field`.
    pub fn field_path(&self, field: TrackedField) -> PathBuf {
        self.dir.join(format!("{}.json", field.key()))
    }

    fn read_field<T: DeserializeOwned>(&self, field: TrackedField) -> Option<T> {
        let path = self.field_path(field);
        if !path.exists() {
            return None;
        }

        let parsed = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))
            .and_then(|content| {
                serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse {}", path.display()))
            });

        match parsed {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(%field, error = %format!("{err:#}"), "Ignoring unreadable stored field");
                None
            }
        }
    }
}

impl PersistenceBridge for LocalStore {
    fn load(&mut self) -> Result<CatalogSnapshot> {
        Ok(CatalogSnapshot {
            sites: self.read_field(TrackedField::Sites),
            categories: self.read_field(TrackedField::Categories),
            category_colors: self.read_field(TrackedField::CategoryColors),
            hidden_categories: self.read_field(TrackedField::HiddenCategories),
            layout: self.read_field(TrackedField::Layout),
            config: self.read_field(TrackedField::Config),
            theme: self.read_field(TrackedField::Theme),
            custom_fonts: self.read_field(TrackedField::CustomFonts),
        })
    }

    fn write(&mut self, field: TrackedField, value: &Value) -> Result<()> {
        let path = self.field_path(field);
        let content =
            serde_json::to_string_pretty(value).context("Failed to serialize catalog field")?;

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write temp file: {}", temp_path.display()))?;
        fs::rename(&temp_path, &path)
            .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

        debug!(%field, "Wrote catalog field");
        Ok(())
    }
}

/// Result of a flush.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Fields written successfully.
    pub written: Vec<TrackedField>,
    /// Fields whose write failed, with the error; they stay dirty.
    pub failed: Vec<(TrackedField, String)>,
}

impl FlushReport {
    /// Whether every dirty field reached storage.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A catalog bound to its storage.
///
/// Every mutation made through the session is followed by a flush of the
/// fields it dirtied. Write failures are logged and the field stays dirty
/// for the next flush; the in-memory catalog remains authoritative.
#[derive(Debug)]
pub struct CatalogSession<B: PersistenceBridge> {
    store: CatalogStore,
    bridge: B,
}

impl<B: PersistenceBridge> CatalogSession<B> {
    /// Hydrates the catalog from `bridge`.
    ///
    /// Fields repaired during hydration are written back immediately.
    pub fn open(mut bridge: B) -> Result<Self> {
        let snapshot = bridge.load().context("Failed to load catalog")?;
        let store = CatalogStore::from_snapshot(snapshot);
        let mut session = Self { store, bridge };
        session.flush();
        Ok(session)
    }

    /// The live catalog.
    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    /// The storage backend.
    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    /// Runs a mutation and flushes what it dirtied.
    ///
    /// The flush runs even if `op` fails, since a failed operation may have
    /// been preceded by successful ones in the same closure.
    pub fn apply<R>(
        &mut self,
        op: impl FnOnce(&mut CatalogStore) -> crate::error::Result<R>,
    ) -> crate::error::Result<R> {
        let result = op(&mut self.store);
        self.flush();
        result
    }

    /// Deletes a category and its sites, and persists the cascade.
    ///
    /// Reports [`CatalogError::CascadeIncomplete`] if any field of the
    /// cascade could not be written, even though memory already reflects
    /// the delete. Failures of unrelated fields that were already dirty are
    /// left to the next flush.
    pub fn delete_category(&mut self, name: &str) -> crate::error::Result<Vec<Site>> {
        let mut cascade = vec![
            TrackedField::Sites,
            TrackedField::Categories,
            TrackedField::CategoryColors,
        ];
        if self.store.is_hidden(name) {
            cascade.push(TrackedField::HiddenCategories);
        }

        let removed = self.store.delete_category(name)?;
        let report = self.flush();

        let failed: Vec<_> = report
            .failed
            .iter()
            .filter(|(field, _)| cascade.contains(field))
            .collect();
        if !failed.is_empty() {
            let details = failed
                .iter()
                .map(|(field, err)| format!("{field}: {err}"))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(CatalogError::CascadeIncomplete {
                category: name.to_string(),
                details,
            });
        }
        Ok(removed)
    }

    /// Merges a validated import and persists it.
    pub fn import(&mut self, payload: ImportPayload) -> crate::error::Result<ImportReport> {
        let report = ImportReconciler::merge(&mut self.store, payload)
            .map_err(|err| CatalogError::InvalidSnapshot(err.to_string()))?;
        self.flush();
        Ok(report)
    }

    /// Writes every dirty field.
    pub fn flush(&mut self) -> FlushReport {
        let mut report = FlushReport::default();
        let dirty: Vec<TrackedField> = self.store.dirty_fields().iter().copied().collect();

        for field in dirty {
            let outcome = self
                .store
                .field_value(field)
                .map_err(anyhow::Error::from)
                .and_then(|value| self.bridge.write(field, &value));

            match outcome {
                Ok(()) => {
                    self.store.mark_clean(field);
                    report.written.push(field);
                }
                Err(err) => {
                    warn!(%field, error = %format!("{err:#}"), "Failed to persist catalog field");
                    report.failed.push((field, format!("{err:#}")));
                }
            }
        }

        report
    }

    /// Splits the session into its parts.
    pub fn into_parts(self) -> (CatalogStore, B) {
        (self.store, self.bridge)
    }
}
