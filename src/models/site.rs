//! Sites: the bookmarks shown as cards on the dashboard.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use url::Url;
use uuid::Uuid;

use crate::models::RgbColor;

/// Opaque, stable site identifier.
///
/// Accepted as a string or an integer on input (older backups used numeric
/// ids) and always stored as a string. Ids are never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SiteId(String);

impl SiteId {
    /// Wraps an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SiteId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl<'de> Deserialize<'de> for SiteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Text(text) if text.trim().is_empty() => {
                Err(serde::de::Error::custom("site id cannot be empty"))
            }
            RawId::Text(text) => Ok(Self(text)),
            RawId::Number(number) => Ok(Self(number.to_string())),
        }
    }
}

/// How a site's icon is obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IconSource {
    /// Probe the favicon providers with the site's hostname.
    #[default]
    Auto,
    /// A user-supplied image (data URL or stored asset reference).
    Upload {
        /// The uploaded payload, if one was ever stored.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<String>,
    },
    /// A glyph from the built-in icon library.
    Library {
        /// Library key, e.g. "github".
        #[serde(default)]
        key: String,
    },
}

impl IconSource {
    /// Short name of the strategy, as used on the wire.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Upload { .. } => "upload",
            Self::Library { .. } => "library",
        }
    }
}

/// A bookmarked site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    /// Stable identity.
    #[serde(default = "SiteId::generate")]
    pub id: SiteId,
    /// Card title.
    pub name: String,
    /// Target URL.
    pub url: String,
    /// Free-form description, searched together with the name.
    #[serde(default)]
    pub description: String,
    /// Owning category, by name.
    pub category: String,
    /// Brand color, also the letter-avatar background.
    #[serde(default)]
    pub color: RgbColor,
    /// Icon strategy and payload.
    #[serde(default)]
    pub icon: IconSource,
    /// Display order, stored globally across categories.
    #[serde(default)]
    pub order: i64,
    /// Rendering hint; kept with the site but not used for filtering.
    #[serde(default)]
    pub hidden: bool,
}

impl Site {
    /// Creates a site with a fresh id and default presentation.
    pub fn new(name: impl Into<String>, url: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: SiteId::generate(),
            name: name.into(),
            url: url.into(),
            description: String::new(),
            category: category.into(),
            color: RgbColor::default(),
            icon: IconSource::Auto,
            order: 0,
            hidden: false,
        }
    }

    /// Replaces the generated id.
    pub fn with_id(mut self, id: impl Into<SiteId>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the brand color.
    pub fn with_color(mut self, color: RgbColor) -> Self {
        self.color = color;
        self
    }

    /// Sets the icon strategy.
    pub fn with_icon(mut self, icon: IconSource) -> Self {
        self.icon = icon;
        self
    }

    /// Hostname of the site's URL.
    ///
    /// URLs typed without a scheme ("github.com/foo") are read as https.
    /// Returns `None` when no hostname can be extracted.
    pub fn hostname(&self) -> Option<String> {
        hostname_of(&self.url)
    }
}

/// Extracts the hostname from a URL, tolerating a missing scheme.
pub fn hostname_of(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let parsed = match Url::parse(raw) {
        Ok(url) if url.has_host() => url,
        Ok(url)
            if matches!(
                url.scheme(),
                "mailto" | "javascript" | "data" | "tel" | "file" | "about"
            ) =>
        {
            return None
        }
        _ => Url::parse(&format!("https://{raw}")).ok()?,
    };

    match parsed.scheme() {
        "http" | "https" => parsed
            .host_str()
            .filter(|host| !host.is_empty())
            .map(str::to_ascii_lowercase),
        _ => None,
    }
}

impl From<String> for SiteId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
