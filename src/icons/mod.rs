//! Icon resolution for site cards.
//!
//! A site's [`IconSource`] decides where its glyph comes from:
//!
//! - `Upload` returns the stored payload verbatim,
//! - `Library` looks the key up in the embedded [`IconLibrary`],
//! - `Auto` walks an ordered list of favicon providers.
//!
//! Every path degrades to a deterministic letter-avatar. Provider failures
//! are reported back through [`IconResolver::report_failure`], which moves
//! the site's cursor to the next provider. Cursors live in an
//! [`IconCursorTable`] owned by the caller and are never persisted.

pub mod library;
pub mod sync;

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use crate::constants::{AVATAR_PLACEHOLDER, DEFAULT_FAVICON_PROVIDERS};
use crate::models::{hostname_of, IconSource, RgbColor, Site, SiteId};

pub use library::{IconLibrary, LibraryIcon};

/// A favicon service addressed by hostname.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaviconProvider {
    /// Short name used in logs and glyph metadata.
    pub name: String,
    /// URL template with a `{host}` placeholder.
    pub template: String,
}

impl FaviconProvider {
    /// Creates a provider.
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
        }
    }

    /// The built-in provider chain.
    pub fn defaults() -> Vec<Self> {
        DEFAULT_FAVICON_PROVIDERS
            .iter()
            .map(|(name, template)| Self::new(*name, *template))
            .collect()
    }

    /// Favicon URL for `host`.
    pub fn url_for(&self, host: &str) -> String {
        self.template.replace("{host}", host)
    }
}

/// What a card should draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Glyph {
    /// A remote or inline image.
    Image {
        /// Image URL or data URL.
        src: String,
        /// Provider that produced the URL; `None` for uploads.
        #[serde(skip_serializing_if = "Option::is_none")]
        provider: Option<String>,
    },
    /// A built-in outline glyph.
    Library(LibraryIcon),
    /// A colored disc with the site's initial.
    #[serde(rename_all = "camelCase")]
    LetterAvatar {
        /// Uppercased initial, or the placeholder.
        letter: String,
        /// Disc color (the site color).
        background: RgbColor,
        /// Letter color, black or white by contrast.
        foreground: RgbColor,
    },
}

impl Glyph {
    /// Letter-avatar for a site.
    pub fn letter_avatar(site: &Site) -> Self {
        let letter = site
            .name
            .trim()
            .chars()
            .next()
            .map_or_else(|| AVATAR_PLACEHOLDER.to_string(), |c| c.to_uppercase().collect());

        Self::LetterAvatar {
            letter,
            background: site.color,
            foreground: site.color.contrasting_text(),
        }
    }

    /// Whether this is the fallback avatar.
    pub fn is_letter_avatar(&self) -> bool {
        matches!(self, Self::LetterAvatar { .. })
    }

    /// Inline SVG markup; `None` for images.
    pub fn to_svg(&self) -> Option<String> {
        match self {
            Self::Image { .. } => None,
            Self::Library(icon) => Some(format!(
                concat!(
                    r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" fill="none" "#,
                    r#"stroke="currentColor" stroke-width="2" stroke-linecap="round" "#,
                    r#"stroke-linejoin="round"><path d="{}"/></svg>"#
                ),
                escape_xml(&icon.path)
            )),
            Self::LetterAvatar {
                letter,
                background,
                foreground,
            } => Some(format!(
                concat!(
                    r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 64 64">"#,
                    r#"<circle cx="32" cy="32" r="32" fill="{}"/>"#,
                    r#"<text x="32" y="32" dy=".35em" text-anchor="middle" "#,
                    r#"font-family="system-ui, sans-serif" font-size="30" font-weight="600" "#,
                    r#"fill="{}">{}</text></svg>"#
                ),
                background,
                foreground,
                escape_xml(letter)
            )),
        }
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Per-site position in the provider chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconCursor {
    /// Index of the provider to try next.
    pub index: usize,
    /// Hash of the inputs the cursor was computed for.
    pub signature: u64,
}

/// Ephemeral cursors for every displayed site.
#[derive(Debug, Default)]
pub struct IconCursorTable {
    cursors: HashMap<SiteId, IconCursor>,
}

impl IconCursorTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor for `site_id`, reset to 0 when `signature` changed.
    fn entry(&mut self, site_id: &SiteId, signature: u64) -> &mut IconCursor {
        let cursor = self
            .cursors
            .entry(site_id.clone())
            .or_insert(IconCursor {
                index: 0,
                signature,
            });
        if cursor.signature != signature {
            *cursor = IconCursor {
                index: 0,
                signature,
            };
        }
        cursor
    }

    /// Current cursor of a site, if it was ever resolved.
    pub fn get(&self, site_id: &SiteId) -> Option<IconCursor> {
        self.cursors.get(site_id).copied()
    }

    /// Drops the cursor of a deleted site.
    pub fn forget(&mut self, site_id: &SiteId) {
        self.cursors.remove(site_id);
    }

    /// Number of tracked sites.
    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    /// Whether no site is tracked.
    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }
}

/// Resolves site icons against a provider chain and the icon library.
#[derive(Debug, Clone)]
pub struct IconResolver {
    providers: Vec<FaviconProvider>,
    library: IconLibrary,
}

impl Default for IconResolver {
    fn default() -> Self {
        Self::new(FaviconProvider::defaults())
    }
}

impl IconResolver {
    /// Creates a resolver over `providers`, tried in order.
    pub fn new(providers: Vec<FaviconProvider>) -> Self {
        Self {
            providers,
            library: IconLibrary::default(),
        }
    }

    /// The provider chain.
    pub fn providers(&self) -> &[FaviconProvider] {
        &self.providers
    }

    /// The icon library.
    pub fn library(&self) -> &IconLibrary {
        &self.library
    }

    /// Glyph to display for `site` right now.
    ///
    /// Every strategy records its signature, so switching away from `Auto`
    /// and back starts the provider chain over.
    pub fn resolve(&self, site: &Site, cursors: &mut IconCursorTable) -> Glyph {
        let index = cursors.entry(&site.id, self.signature(site)).index;
        match &site.icon {
            IconSource::Auto => self.resolve_at(site, index),
            IconSource::Upload { data: Some(data) } if !data.trim().is_empty() => Glyph::Image {
                src: data.clone(),
                provider: None,
            },
            IconSource::Upload { .. } => Glyph::letter_avatar(site),
            IconSource::Library { key } => self
                .library
                .get(key)
                .map_or_else(|| Glyph::letter_avatar(site), |icon| Glyph::Library(icon.clone())),
        }
    }

    /// Glyph for an `Auto` site with its cursor at `index`.
    ///
    /// Past the last provider, or without a hostname, this is the
    /// letter-avatar.
    pub fn resolve_at(&self, site: &Site, index: usize) -> Glyph {
        let Some(host) = site.hostname() else {
            return Glyph::letter_avatar(site);
        };
        match self.providers.get(index) {
            Some(provider) => Glyph::Image {
                src: provider.url_for(&host),
                provider: Some(provider.name.clone()),
            },
            None => Glyph::letter_avatar(site),
        }
    }

    /// Records that the current glyph of `site` failed to load and returns
    /// the next one to try.
    pub fn report_failure(&self, site: &Site, cursors: &mut IconCursorTable) -> Glyph {
        if site.icon == IconSource::Auto {
            let cursor = cursors.entry(&site.id, self.signature(site));
            cursor.index = (cursor.index + 1).min(self.providers.len());
            tracing::debug!(site = %site.id, next = cursor.index, "Favicon failed, advancing");
        }
        self.resolve(site, cursors)
    }

    /// Hash of everything a cursor depends on: URL, icon strategy and the
    /// provider chain.
    fn signature(&self, site: &Site) -> u64 {
        let mut hasher = DefaultHasher::new();
        site.url.hash(&mut hasher);
        site.icon.kind().hash(&mut hasher);
        self.providers.hash(&mut hasher);
        hasher.finish()
    }
}
