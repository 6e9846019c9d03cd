//! Relational store for the server.
//!
//! A thin `rusqlite` adapter: sites and categories keyed by identity,
//! singleton settings as JSON values, custom fonts and the favicon cache
//! index. The server shares one [`Repository`] behind a mutex.

pub mod migrations;
pub mod repository;

pub use repository::{CategoryRow, Repository};
