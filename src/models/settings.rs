//! Singleton settings records: grid layout, branding and theme.
//!
//! Every field has a compiled-in default. Records loaded with missing fields
//! are backfilled from those defaults (`#[serde(default)]`), and partial
//! updates are merged over the current value field by field.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::LOCAL_SEARCH_ENGINE;
use crate::models::RgbColor;

/// Dashboard background style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundMode {
    /// Solid `backgroundColor`.
    #[default]
    Color,
    /// Gradient derived from `backgroundColor`.
    Gradient,
    /// `backgroundImage` stretched over the page.
    Image,
}

/// Grid and card presentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutSettings {
    /// Number of grid columns.
    pub grid_cols: u32,
    /// Gap between cards, in pixels.
    pub gap: u32,
    /// Card height, in pixels.
    pub card_height: u32,
    /// Card corner radius, in pixels.
    pub card_radius: u32,
    /// Background style.
    pub background_mode: BackgroundMode,
    /// Background color (also the gradient base).
    pub background_color: RgbColor,
    /// Background image URL, used in `image` mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    /// Font family key, either a system stack or a custom font id.
    pub font: String,
    /// Show site descriptions on cards.
    pub show_description: bool,
    /// Tint cards with their category color.
    pub show_category_colors: bool,
    /// Dark card surfaces regardless of theme.
    pub dark_cards: bool,
    /// Open sites in a new browser tab.
    pub open_in_new_tab: bool,
    /// Selected search engine id.
    pub search_engine: String,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            grid_cols: 4,
            gap: 16,
            card_height: 100,
            card_radius: 12,
            background_mode: BackgroundMode::default(),
            background_color: RgbColor::new(0xF1, 0xF5, 0xF9),
            background_image: None,
            font: "system".to_string(),
            show_description: true,
            show_category_colors: true,
            dark_cards: false,
            open_in_new_tab: true,
            search_engine: LOCAL_SEARCH_ENGINE.to_string(),
        }
    }
}

/// How the page header shows the brand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogoMode {
    /// `logoText` rendered as a word mark.
    #[default]
    Text,
    /// `logoImage` rendered as an image.
    Image,
    /// No logo.
    None,
}

/// A link in the page footer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FooterLink {
    /// Link text.
    pub label: String,
    /// Link target.
    pub url: String,
}

/// Branding record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Browser tab and header title.
    pub site_title: String,
    /// Logo style.
    pub logo_mode: LogoMode,
    /// Word mark for `text` mode.
    pub logo_text: String,
    /// Image URL for `image` mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_image: Option<String>,
    /// Footer line.
    pub footer_text: String,
    /// Footer links, in display order.
    pub footer_links: Vec<FooterLink>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            site_title: "StartDeck".to_string(),
            logo_mode: LogoMode::default(),
            logo_text: "StartDeck".to_string(),
            logo_image: None,
            footer_text: String::new(),
            footer_links: Vec::new(),
        }
    }
}

/// Color scheme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Follow the operating system
    #[default]
    Auto,
    /// Always light
    Light,
    /// Always dark
    Dark,
}

/// Merges `patch` over `current` one top-level field at a time.
///
/// Fields absent from `patch` keep their current value. A field whose new
/// value does not fit the record's type fails the whole merge, leaving
/// `current` unchanged for the caller.
///
/// # Errors
///
/// Returns the deserialization error of the merged record.
pub fn merge_fields<T>(current: &T, patch: &Map<String, Value>) -> serde_json::Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut merged = match serde_json::to_value(current)? {
        Value::Object(fields) => fields,
        other => return serde_json::from_value(other),
    };

    for (key, value) in patch {
        merged.insert(key.clone(), value.clone());
    }

    serde_json::from_value(Value::Object(merged))
}
