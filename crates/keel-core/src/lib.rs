//! keel-core: data model, SQLite store, and mutation service for the
//! keel issue tracker.
//!
//! # Conventions
//!
//! - **Errors**: the closed [`error::CoreError`] taxonomy at the service
//!   boundary; `anyhow::Result` with context at fallible plumbing seams.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod access;
pub mod audit;
pub mod codes;
pub mod config;
pub mod db;
pub mod error;
pub mod hierarchy;
pub mod model;
pub mod notify;
pub mod service;
pub mod workflow;

use chrono::{SecondsFormat, Utc};

/// The store's canonical timestamp format (UTC, RFC 3339, seconds).
#[must_use]
pub fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
