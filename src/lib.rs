//! StartDeck Library
//!
//! This library provides the catalog engine behind the StartDeck start
//! page: sites and categories with stable ordering, search filtering,
//! favicon resolution with letter-avatar fallback, import reconciliation
//! and persistence to a local store or a SQLite database.

// Module declarations
pub mod catalog;
pub mod cli;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod icons;
pub mod models;
pub mod services;
#[cfg(feature = "web")]
pub mod web;
