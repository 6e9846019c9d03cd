//! The catalog exchange format used for backups, exports and persistence.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use super::{AppConfig, Category, LayoutSettings, RgbColor, Site, ThemeMode};

/// A user-uploaded web font.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFont {
    /// Stable identity; upserts key on it.
    pub id: String,
    /// Display name in the font picker.
    pub name: String,
    /// CSS `font-family` value.
    pub family: String,
    /// Where the font file lives (URL or data URL).
    pub url: String,
}

/// A full or partial catalog.
///
/// Every field is optional: exports carry all of them, while imported
/// backups may carry any subset. Absent fields leave live state untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    /// Sites, in display order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sites: Option<Vec<Site>>,
    /// Categories, in display order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Category>>,
    /// Category name to color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_colors: Option<BTreeMap<String, RgbColor>>,
    /// Names of hidden categories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden_categories: Option<Vec<String>>,
    /// Grid and card settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutSettings>,
    /// Branding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<AppConfig>,
    /// Color scheme preference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeMode>,
    /// Uploaded fonts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_fonts: Option<Vec<CustomFont>>,
}

/// One persisted field of the catalog.
///
/// Persistence writes whole fields, so a mutation marks the fields it
/// touched and each one is written back in full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TrackedField {
    /// `sites`
    Sites,
    /// `categories`
    Categories,
    /// `categoryColors`
    CategoryColors,
    /// `hiddenCategories`
    HiddenCategories,
    /// `layout`
    Layout,
    /// `config`
    Config,
    /// `theme`
    Theme,
    /// `customFonts`
    CustomFonts,
}

impl TrackedField {
    /// Every tracked field, in load order.
    pub const ALL: [Self; 8] = [
        Self::Sites,
        Self::Categories,
        Self::CategoryColors,
        Self::HiddenCategories,
        Self::Layout,
        Self::Config,
        Self::Theme,
        Self::CustomFonts,
    ];

    /// The snapshot key of this field.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Sites => "sites",
            Self::Categories => "categories",
            Self::CategoryColors => "categoryColors",
            Self::HiddenCategories => "hiddenCategories",
            Self::Layout => "layout",
            Self::Config => "config",
            Self::Theme => "theme",
            Self::CustomFonts => "customFonts",
        }
    }
}

impl fmt::Display for TrackedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl Serialize for TrackedField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}
