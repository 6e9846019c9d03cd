//! Categories group sites into tabs on the dashboard.

use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::{ALL_CATEGORY, MAX_CATEGORY_NAME_LEN};
use crate::error::{CatalogError, Result};

/// User-defined category.
///
/// The name is the identity: sites reference their category by name, and
/// renaming is modelled as delete + recreate. Color and visibility live on
/// the catalog (`categoryColors`, `hiddenCategories`), keyed by this name.
///
/// # Validation
///
/// - Name is trimmed and must be non-empty, max 50 characters
/// - Name cannot be the virtual "All" category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    /// Unique display name.
    pub name: String,
    /// Position among categories; renumbered after every reorder.
    pub order: i64,
}

impl Category {
    /// Creates a new Category with validation.
    ///
    /// # Examples
    ///
    /// ```
    /// use startdeck::models::Category;
    ///
    /// let category = Category::new("  Work ").unwrap();
    /// assert_eq!(category.name, "Work");
    /// assert!(Category::new("All").is_err());
    /// ```
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let name = Self::validate_name(name.as_ref())?;
        Ok(Self { name, order: 0 })
    }

    /// Validates and normalizes a category name.
    pub fn validate_name(name: &str) -> Result<String> {
        let trimmed = name.trim();
        let reject = |reason: &str| CatalogError::InvalidCategoryName {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        if trimmed.is_empty() {
            return Err(reject("name cannot be empty"));
        }

        if trimmed.chars().count() > MAX_CATEGORY_NAME_LEN {
            return Err(reject(&format!(
                "name exceeds maximum length of {MAX_CATEGORY_NAME_LEN} characters"
            )));
        }

        if trimmed.eq_ignore_ascii_case(ALL_CATEGORY) {
            return Err(reject("\"All\" is reserved for the aggregate view"));
        }

        Ok(trimmed.to_string())
    }
}

impl<'de> Deserialize<'de> for Category {
    /// Accepts either a bare name (`"Work"`) or `{ "name": "Work", "order": 2 }`.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawCategory {
            Name(String),
            Record {
                name: String,
                #[serde(default)]
                order: i64,
            },
        }

        let (name, order) = match RawCategory::deserialize(deserializer)? {
            RawCategory::Name(name) => (name, 0),
            RawCategory::Record { name, order } => (name, order),
        };

        let name = Self::validate_name(&name).map_err(serde::de::Error::custom)?;
        Ok(Self { name, order })
    }
}
