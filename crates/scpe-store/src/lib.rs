//! # scpe-store
//!
//! Project store for SCPE, backed by SQLite.
//!
//! Holds users, projects, project memberships, tasks and project messages.
//! The crate exposes a synchronous [`Database`] handle with typed operations
//! for every entity plus aggregate reports.  Each operation runs in its own
//! short-lived connection and transaction; the handle itself only remembers
//! where the database lives and how to configure connections.

pub mod config;
pub mod database;
pub mod members;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod projects;
pub mod reports;
pub mod session;
pub mod tasks;
pub mod users;

mod error;
mod row;

#[cfg(test)]
mod testutil;

pub use config::{OrphanPolicy, StoreConfig};
pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
pub use reports::{completion_percent, completion_rate, Dashboard, Overview, ProjectReport};
pub use session::Session;
