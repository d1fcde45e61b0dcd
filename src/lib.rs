//! District 8 Travel League operations server.
//!
//! The domain models and database live in `d8tl-core`; this crate adds
//! the HTTP API, portal authentication, configuration and the
//! operational CLI around them.

pub mod api;
pub mod auth;
pub mod config;
pub mod logging;
pub mod notifier;
pub mod ops;
