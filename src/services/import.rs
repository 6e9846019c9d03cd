//! Import reconciliation: validating external snapshots and merging them.
//!
//! An import is validated completely before anything is applied. A payload
//! that fails validation is rejected as a whole and leaves the catalog
//! untouched; the one exception is custom fonts, which are checked one at a
//! time so a single bad font is skipped instead of failing the batch.
//!
//! Applying a validated payload follows these rules:
//!
//! - `sites`, `categories`, `categoryColors`, `hiddenCategories`, `theme`
//!   and `customFonts` replace the live value when present,
//! - `layout` and `config` are merged over the live value field by field,
//! - absent fields are left alone.
//!
//! Replaying the same import yields the same catalog.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogEvent, CatalogStore};
use crate::models::{
    merge_fields, AppConfig, Category, CustomFont, LayoutSettings, RgbColor, Site, ThemeMode,
    TrackedField,
};

/// Why an import was rejected.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The payload is not valid JSON.
    #[error("Import file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The top-level value is not an object.
    #[error("Import payload must be a JSON object")]
    NotAnObject,

    /// A top-level field has the wrong JSON type.
    #[error("Field '{field}' must be {expected}")]
    WrongShape {
        /// Snapshot key.
        field: &'static str,
        /// Expected JSON type, e.g. "an array".
        expected: &'static str,
    },

    /// An entry inside a field failed to deserialize.
    #[error("Invalid entry in '{field}': {message}")]
    InvalidEntry {
        /// Snapshot key.
        field: &'static str,
        /// Deserialization error.
        message: String,
    },
}

/// A snapshot that passed validation and is ready to apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportPayload {
    /// Replacement sites.
    pub sites: Option<Vec<Site>>,
    /// Replacement categories.
    pub categories: Option<Vec<Category>>,
    /// Replacement category colors.
    pub category_colors: Option<BTreeMap<String, RgbColor>>,
    /// Replacement hidden-category list.
    pub hidden_categories: Option<Vec<String>>,
    /// Partial layout, merged over the live one.
    pub layout: Option<Map<String, Value>>,
    /// Partial branding, merged over the live one.
    pub config: Option<Map<String, Value>>,
    /// Replacement theme.
    pub theme: Option<ThemeMode>,
    /// Fonts that parsed; replace the live list.
    pub custom_fonts: Option<Vec<CustomFont>>,
    /// Ids (or positions) of fonts that failed to parse.
    pub skipped_fonts: Vec<String>,
}

impl ImportPayload {
    /// Fields this payload carries, in persistence order.
    pub fn fields(&self) -> Vec<TrackedField> {
        TrackedField::ALL
            .into_iter()
            .filter(|field| match field {
                TrackedField::Sites => self.sites.is_some(),
                TrackedField::Categories => self.categories.is_some(),
                TrackedField::CategoryColors => self.category_colors.is_some(),
                TrackedField::HiddenCategories => self.hidden_categories.is_some(),
                TrackedField::Layout => self.layout.is_some(),
                TrackedField::Config => self.config.is_some(),
                TrackedField::Theme => self.theme.is_some(),
                TrackedField::CustomFonts => self.custom_fonts.is_some(),
            })
            .collect()
    }
}

/// Outcome of an applied import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// Fields that were replaced or merged.
    pub applied: Vec<TrackedField>,
    /// Fonts skipped because they failed to parse or to store.
    pub skipped_fonts: Vec<String>,
}

/// Validates and applies catalog imports.
pub struct ImportReconciler;

impl ImportReconciler {
    /// Parses and validates an import file's contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not JSON or fails [`validate`](Self::validate).
    pub fn parse_str(text: &str) -> Result<ImportPayload, ImportError> {
        let value: Value = serde_json::from_str(text)?;
        Self::validate(&value)
    }

    /// Validates a snapshot without applying it.
    ///
    /// # Arguments
    ///
    /// * `value` - The raw snapshot, usually straight from an upload
    ///
    /// # Returns
    ///
    /// * `Ok(ImportPayload)` - Every present field is well-formed
    /// * `Err(ImportError)` - The first problem found; nothing may be applied
    pub fn validate(value: &Value) -> Result<ImportPayload, ImportError> {
        let object = value.as_object().ok_or(ImportError::NotAnObject)?;

        let mut payload = ImportPayload {
            sites: parse_array(object, "sites")?,
            categories: parse_array(object, "categories")?,
            category_colors: parse_object_as(object, "categoryColors")?,
            hidden_categories: parse_array(object, "hiddenCategories")?,
            layout: parse_patch::<LayoutSettings>(object, "layout")?,
            config: parse_patch::<AppConfig>(object, "config")?,
            theme: match object.get("theme") {
                None | Some(Value::Null) => None,
                Some(raw) => Some(entry("theme", raw)?),
            },
            custom_fonts: None,
            skipped_fonts: Vec::new(),
        };

        if let Some(raw) = present(object, "customFonts") {
            let items = raw.as_array().ok_or(ImportError::WrongShape {
                field: "customFonts",
                expected: "an array",
            })?;
            let (fonts, skipped) = parse_fonts(items);
            payload.custom_fonts = Some(fonts);
            payload.skipped_fonts = skipped;
        }

        debug!(fields = ?payload.fields(), "Validated import payload");
        Ok(payload)
    }

    /// Merges a validated payload into the live catalog.
    ///
    /// Layout and branding merges are computed before anything changes, so
    /// an error leaves the store exactly as it was. Afterwards, categories
    /// referenced by imported sites but missing are appended and every
    /// category gets a color.
    pub fn merge(store: &mut CatalogStore, payload: ImportPayload) -> Result<ImportReport, ImportError> {
        let applied = payload.fields();

        let layout = payload
            .layout
            .as_ref()
            .map(|patch| merge_fields(store.layout(), patch))
            .transpose()
            .map_err(|err| invalid("layout", &err))?;
        let config = payload
            .config
            .as_ref()
            .map(|patch| merge_fields(store.config(), patch))
            .transpose()
            .map_err(|err| invalid("config", &err))?;

        if let Some(sites) = payload.sites {
            store.replace_sites(sites);
        }
        if let Some(categories) = payload.categories {
            store.replace_categories(categories);
        }
        if let Some(colors) = payload.category_colors {
            store.replace_category_colors(colors);
        }
        if let Some(hidden) = payload.hidden_categories {
            store.replace_hidden_categories(hidden);
        }
        if let Some(layout) = layout {
            store.replace_layout(layout);
        }
        if let Some(config) = config {
            store.replace_config(config);
        }
        if let Some(theme) = payload.theme {
            store.replace_theme(theme);
        }
        if let Some(fonts) = payload.custom_fonts {
            store.replace_custom_fonts(fonts);
        }

        let repaired = store.normalize();
        store.touch(&applied);
        store.touch(&repaired.into_iter().collect::<Vec<_>>());
        store.emit(&CatalogEvent::Imported(applied.clone()));

        if !payload.skipped_fonts.is_empty() {
            warn!(skipped = ?payload.skipped_fonts, "Skipped invalid custom fonts");
        }
        info!(fields = applied.len(), "Merged import into catalog");

        Ok(ImportReport {
            applied,
            skipped_fonts: payload.skipped_fonts,
        })
    }
}

fn present<'a>(object: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    object.get(field).filter(|value| !value.is_null())
}

fn invalid(field: &'static str, err: &impl std::fmt::Display) -> ImportError {
    ImportError::InvalidEntry {
        field,
        message: err.to_string(),
    }
}

fn entry<T: serde::de::DeserializeOwned>(field: &'static str, raw: &Value) -> Result<T, ImportError> {
    serde_json::from_value(raw.clone()).map_err(|err| invalid(field, &err))
}

fn parse_array<T: serde::de::DeserializeOwned>(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<Vec<T>>, ImportError> {
    let Some(raw) = present(object, field) else {
        return Ok(None);
    };
    let items = raw.as_array().ok_or(ImportError::WrongShape {
        field,
        expected: "an array",
    })?;
    items
        .iter()
        .map(|item| entry(field, item))
        .collect::<Result<Vec<T>, _>>()
        .map(Some)
}

fn parse_object_as<T: serde::de::DeserializeOwned>(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<T>, ImportError> {
    let Some(raw) = present(object, field) else {
        return Ok(None);
    };
    if !raw.is_object() {
        return Err(ImportError::WrongShape {
            field,
            expected: "an object",
        });
    }
    entry(field, raw).map(Some)
}

/// Checks a partial settings record by merging it over the defaults.
fn parse_patch<T>(object: &Map<String, Value>, field: &'static str) -> Result<Option<Map<String, Value>>, ImportError>
where
    T: Serialize + serde::de::DeserializeOwned + Default,
{
    let Some(raw) = present(object, field) else {
        return Ok(None);
    };
    let patch = raw.as_object().ok_or(ImportError::WrongShape {
        field,
        expected: "an object",
    })?;
    merge_fields(&T::default(), patch).map_err(|err| invalid(field, &err))?;
    Ok(Some(patch.clone()))
}

fn parse_fonts(items: &[Value]) -> (Vec<CustomFont>, Vec<String>) {
    let mut fonts = Vec::with_capacity(items.len());
    let mut skipped = Vec::new();

    for (index, item) in items.iter().enumerate() {
        match serde_json::from_value::<CustomFont>(item.clone()) {
            Ok(font) => fonts.push(font),
            Err(err) => {
                let id = font_label(item, index);
                debug!(font = %id, error = %err, "Skipping custom font");
                skipped.push(id);
            }
        }
    }

    (fonts, skipped)
}

/// The id of a font record, or `#<index>` when it has none.
pub(crate) fn font_label(item: &Value, index: usize) -> String {
    match item.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => format!("#{index}"),
    }
}
