//! Schema migrations for the relational store.
//!
//! Migrations are forward-only and tracked with `PRAGMA user_version`.
//! Never edit or reorder a migration once it has shipped.

use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// All migrations in order.
const MIGRATIONS: &[&str] = &[
    // 1: catalog tables
    r#"
    CREATE TABLE categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE CHECK (length(trim(name)) > 0),
        sort_order INTEGER NOT NULL DEFAULT 0,
        color TEXT,
        hidden INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE sites (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        url TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        category TEXT NOT NULL,
        color TEXT NOT NULL,
        icon TEXT NOT NULL DEFAULT '{"type":"auto"}',
        sort_order INTEGER NOT NULL DEFAULT 0,
        hidden INTEGER NOT NULL DEFAULT 0
    );

    CREATE INDEX idx_sites_category ON sites(category);

    CREATE TABLE custom_fonts (
        id TEXT PRIMARY KEY CHECK (length(trim(id)) > 0),
        name TEXT NOT NULL,
        family TEXT NOT NULL CHECK (length(trim(family)) > 0),
        url TEXT NOT NULL
    );

    CREATE TABLE settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
    "#,
    // 2: favicon cache
    r"
    CREATE TABLE icon_cache (
        hostname TEXT PRIMARY KEY,
        asset TEXT NOT NULL,
        fetched_at TEXT NOT NULL
    );
    ",
];

/// Current schema version of an open database.
pub fn schema_version(conn: &Connection) -> Result<u32> {
    let version: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    Ok(version)
}

/// Schema version this build migrates to.
pub fn latest_version() -> u32 {
    MIGRATIONS.len() as u32
}

/// Applies every pending migration.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current = schema_version(conn)?;
    let target = latest_version();

    if current > target {
        anyhow::bail!(
            "Database schema version {current} is newer than this build supports (max {target})"
        );
    }

    for (index, migration) in MIGRATIONS.iter().enumerate() {
        let version = index as u32 + 1;
        if version <= current {
            continue;
        }

        conn.execute_batch(migration)?;
        conn.execute_batch(&format!("PRAGMA user_version = {version}"))?;
        info!(version, "Applied database migration");
    }

    Ok(())
}
