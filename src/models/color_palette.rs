//! Category color palette and lazy color assignment.
//!
//! The palette is a fixed, embedded list of ten Tailwind 500-level colors.
//! Categories without a color take `palette[index % len]`, where `index` is
//! the category's position in the current ordering.

use serde::Deserialize;
use std::collections::BTreeMap;

use super::{Category, RgbColor};
use crate::constants::{ALL_CATEGORY, BRAND_COLOR};

/// A fixed list of category colors.
#[derive(Debug, Clone, Deserialize)]
pub struct ColorPalette {
    /// Colors in assignment order.
    pub colors: Vec<PaletteColor>,
}

/// A single palette entry.
#[derive(Debug, Clone, Deserialize)]
pub struct PaletteColor {
    /// Display name of the color (e.g., "Blue").
    pub name: String,
    /// The color itself.
    pub hex: RgbColor,
}

impl ColorPalette {
    /// Load the color palette from embedded JSON data.
    ///
    /// # Errors
    /// Returns an error if the JSON data cannot be parsed.
    pub fn load() -> anyhow::Result<Self> {
        let json_data = include_str!("../data/category_palette.json");
        let palette: Self = serde_json::from_str(json_data)?;
        Ok(palette)
    }

    /// Color at `index`, wrapping around the palette.
    ///
    /// An empty palette yields the brand color.
    #[must_use]
    pub fn color_at(&self, index: usize) -> RgbColor {
        if self.colors.is_empty() {
            return BRAND_COLOR;
        }
        self.colors[index % self.colors.len()].hex
    }

    /// Get the number of colors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether the palette has no colors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::load().unwrap_or_else(|_| Self { colors: Vec::new() })
    }
}

/// Assigns palette colors to categories that do not have one yet.
#[derive(Debug, Clone, Default)]
pub struct CategoryColorAssigner {
    palette: ColorPalette,
}

impl CategoryColorAssigner {
    /// Creates an assigner over a specific palette.
    pub fn new(palette: ColorPalette) -> Self {
        Self { palette }
    }

    /// Returns `existing` extended with a color for every uncolored category.
    ///
    /// Already-colored categories are left untouched, so running this twice
    /// is a no-op the second time. The virtual "All" category is never stored.
    pub fn ensure_colors(
        &self,
        categories: &[Category],
        existing: &BTreeMap<String, RgbColor>,
    ) -> BTreeMap<String, RgbColor> {
        let mut colors = existing.clone();
        colors.remove(ALL_CATEGORY);

        for (index, category) in categories.iter().enumerate() {
            colors
                .entry(category.name.clone())
                .or_insert_with(|| self.palette.color_at(index));
        }

        colors
    }

    /// Resolves the color a category is drawn with.
    pub fn color_of(&self, name: &str, colors: &BTreeMap<String, RgbColor>) -> RgbColor {
        if name == ALL_CATEGORY {
            return BRAND_COLOR;
        }
        colors.get(name).copied().unwrap_or(BRAND_COLOR)
    }
}
