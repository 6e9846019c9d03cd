//! Shared test fixtures for integration tests.
#![allow(dead_code)] // Not every test binary uses every fixture

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A complete backup with two categories, three sites and one custom font.
///
/// "Fun" is hidden; "Dev" has an explicit color, "Fun" relies on the palette.
pub fn sample_snapshot() -> Value {
    json!({
        "sites": [
            {
                "id": "gh",
                "name": "GitHub",
                "url": "https://github.com",
                "description": "Code hosting",
                "category": "Dev",
                "color": "#24292E",
                "icon": { "type": "auto" },
                "order": 0
            },
            {
                "id": "docs",
                "name": "Docs.rs",
                "url": "https://docs.rs",
                "description": "Rust documentation",
                "category": "Dev",
                "color": "#000000",
                "icon": { "type": "library", "key": "book" },
                "order": 1
            },
            {
                "id": "rd",
                "name": "Reddit",
                "url": "https://reddit.com",
                "category": "Fun",
                "color": "#FF4500",
                "order": 2
            }
        ],
        "categories": [
            { "name": "Dev", "order": 0 },
            { "name": "Fun", "order": 1 }
        ],
        "categoryColors": { "Dev": "#112233" },
        "hiddenCategories": ["Fun"],
        "layout": { "gridCols": 5, "cardHeight": 100 },
        "config": { "siteTitle": "My Deck" },
        "theme": "dark",
        "customFonts": [
            { "id": "inter", "name": "Inter", "family": "Inter, sans-serif", "url": "https://fonts.example/inter.woff2" }
        ]
    })
}

/// Creates an empty scratch directory.
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// Writes `value` as pretty JSON to `dir/name` and returns the path.
pub fn write_json(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(value).expect("serialize fixture"))
        .expect("Failed to write fixture file");
    path
}

/// Minimal PNG header; enough for extension sniffing.
pub fn png_bytes() -> Vec<u8> {
    vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D]
}
