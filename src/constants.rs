//! Application-wide constants.
//!
//! This module defines constants used throughout the application,
//! including the application name and the fixed catalog vocabulary.

use crate::models::RgbColor;

/// The display name of the application (human-readable, with proper capitalization).
pub const APP_NAME: &str = "StartDeck";

/// The binary name of the application (used in command examples, lowercase with hyphens).
pub const APP_BINARY_NAME: &str = "startdeck";

/// Name of the virtual category that aggregates every site.
///
/// Never persisted, never colored through the palette, never hidden.
pub const ALL_CATEGORY: &str = "All";

/// Color the virtual "All" category always resolves to.
pub const BRAND_COLOR: RgbColor = RgbColor::new(0x63, 0x66, 0xF1);

/// Maximum length of a category name, in characters.
pub const MAX_CATEGORY_NAME_LEN: usize = 50;

/// Identifier of the search engine that filters the catalog in place.
pub const LOCAL_SEARCH_ENGINE: &str = "local";

/// Glyph shown in a letter-avatar when the site has no name.
pub const AVATAR_PLACEHOLDER: &str = "?";

/// Favicon providers tried in order for sites using automatic icons.
///
/// `{host}` is replaced with the hostname of the site's URL.
pub const DEFAULT_FAVICON_PROVIDERS: &[(&str, &str)] = &[
    ("google", "https://www.google.com/s2/favicons?domain={host}&sz=64"),
    ("duckduckgo", "https://icons.duckduckgo.com/ip3/{host}.ico"),
    ("direct", "https://{host}/favicon.ico"),
];

/// Provider the icon-sync endpoint downloads from.
pub const DEFAULT_SYNC_PROVIDER: &str = "https://www.google.com/s2/favicons?domain={host}&sz=128";

/// Upper bound on a downloaded favicon, in bytes.
pub const FAVICON_MAX_BYTES: usize = 512 * 1024;
