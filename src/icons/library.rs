//! Built-in icon library for sites using `Library` icons.

use serde::{Deserialize, Serialize};

/// A single library glyph: an outline path on a 24x24 grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryIcon {
    /// Lookup key stored in `IconSource::Library`.
    pub key: String,
    /// Display name in the icon picker.
    pub label: String,
    /// SVG path data.
    pub path: String,
}

/// The embedded icon set.
#[derive(Debug, Clone, Deserialize)]
pub struct IconLibrary {
    icons: Vec<LibraryIcon>,
}

impl IconLibrary {
    /// Load the icon library from embedded JSON data.
    ///
    /// # Errors
    /// Returns an error if the JSON data cannot be parsed.
    pub fn load() -> anyhow::Result<Self> {
        let json_data = include_str!("../data/icon_library.json");
        let library: Self = serde_json::from_str(json_data)?;
        Ok(library)
    }

    /// Looks up a glyph by key (case-insensitive).
    pub fn get(&self, key: &str) -> Option<&LibraryIcon> {
        let key = key.trim();
        self.icons
            .iter()
            .find(|icon| icon.key.eq_ignore_ascii_case(key))
    }

    /// All glyphs, in picker order.
    pub fn icons(&self) -> &[LibraryIcon] {
        &self.icons
    }
}

impl Default for IconLibrary {
    fn default() -> Self {
        Self::load().unwrap_or_else(|_| Self { icons: Vec::new() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_loads() {
        let library = IconLibrary::load().unwrap();
        assert!(!library.icons().is_empty());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let library = IconLibrary::load().unwrap();
        assert_eq!(library.get("Mail").unwrap().key, "mail");
        assert!(library.get("no-such-icon").is_none());
    }

    #[test]
    fn test_keys_are_unique() {
        let library = IconLibrary::load().unwrap();
        let mut keys: Vec<_> = library.icons().iter().map(|i| i.key.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), library.icons().len());
    }
}
