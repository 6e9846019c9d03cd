//! Data models for sites, categories, settings and snapshots.
//!
//! This module contains the plain data structures of the catalog.
//! Models are independent of storage and presentation.

pub mod category;
pub mod color_palette;
pub mod rgb;
pub mod settings;
pub mod site;
pub mod snapshot;

// Re-export all model types
pub use category::Category;
pub use color_palette::{CategoryColorAssigner, ColorPalette, PaletteColor};
pub use rgb::RgbColor;
pub use settings::{
    merge_fields, AppConfig, BackgroundMode, FooterLink, LayoutSettings, LogoMode, ThemeMode,
};
pub use site::{hostname_of, IconSource, Site, SiteId};
pub use snapshot::{CatalogSnapshot, CustomFont, TrackedField};
