//! Error types for catalog operations.

use thiserror::Error;

use crate::models::SiteId;

/// Errors raised by catalog mutations, imports and the relational store.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Database error from the relational store.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Filesystem error from the local store or icon cache.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A site references a category that does not exist.
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// The named category does not exist.
    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    /// The site id does not exist.
    #[error("Site not found: {0}")]
    SiteNotFound(SiteId),

    /// A category name failed validation.
    #[error("Invalid category name '{name}': {reason}")]
    InvalidCategoryName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An imported snapshot was rejected before anything was applied.
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// A cascading category delete did not fully reach durable storage.
    #[error("Cascading delete of category '{category}' incomplete: {details}")]
    CascadeIncomplete {
        /// The category being deleted.
        category: String,
        /// What failed.
        details: String,
    },

    /// Catch-all for persistence layers reporting through `anyhow`.
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for CatalogError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(format!("{err:#}"))
    }
}

/// Result alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
