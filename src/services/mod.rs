//! Services layered on top of the catalog: import reconciliation and
//! persistence.

pub mod import;
pub mod persistence;

pub use import::{ImportError, ImportPayload, ImportReconciler, ImportReport};
pub use persistence::{CatalogSession, FlushReport, LocalStore, PersistenceBridge};
