//! Core library for D8TL (District 8 Travel League).
//!
//! This crate provides the league domain models and database operations,
//! independent of any transport layer (HTTP, CLI, etc.).
//!
//! # Usage
//!
//! ```no_run
//! use d8tl_core::db::Database;
//! use d8tl_core::models::*;
//!
//! let db = Database::open_default()?;
//! db.migrate()?;
//!
//! let programs = db.list_programs()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod db;
pub mod models;
pub mod notify;
pub mod standings;

// Re-export commonly used types at crate root
pub use db::Database;
