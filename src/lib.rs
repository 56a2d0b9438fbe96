//! Workout logging core.
//!
//! Everything a logging surface needs, behind plain synchronous calls: a
//! per-user exercise catalog, an append-mostly store of logged sets,
//! progress queries for trend display, CSV import/export, and whole-store
//! JSON backups. No UI, HTTP, or authentication lives here.

pub mod config;
pub mod db;
pub mod error;
pub mod migrations;
pub mod models;
pub mod repositories;
pub mod transfer;

pub use config::Config;
pub use error::{Error, Result};
