//! # scpe-shared
//!
//! Types shared by every SCPE crate: row identifiers, role and status enums,
//! password hashing and the constants the other crates agree on.

pub mod constants;
pub mod error;
pub mod password;
pub mod types;

pub use error::{ParseEnumError, PasswordError};
pub use types::{MessageId, ProjectId, ProjectStatus, Role, TaskId, TaskStatus, UserId};
