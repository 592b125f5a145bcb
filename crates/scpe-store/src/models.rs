//! Domain model structs persisted in the project database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the presentation layer.

use chrono::{DateTime, NaiveDate, Utc};
use scpe_shared::{MessageId, ProjectId, ProjectStatus, Role, TaskId, TaskStatus, UserId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered account.  The password hash never leaves the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    pub email: String,
    pub role: Role,
    pub full_name: String,
    /// When the account was registered.
    pub created_at: DateTime<Utc>,
}

/// The subset of [`User`] shown in user listings and team tables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub full_name: String,
    pub role: Role,
}

/// Registration input.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    /// Argon2id PHC string produced by `scpe_shared::password::hash_password`.
    pub password_hash: String,
    pub email: String,
    pub role: Role,
    pub full_name: String,
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    /// Customer the project is delivered to.
    pub client: String,
    pub budget: f64,
    pub deadline: NaiveDate,
    /// Owning manager.  Implicitly a participant of the project.
    pub manager_id: UserId,
    /// Display name of the manager.
    pub manager_name: Option<String>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub client: String,
    pub budget: f64,
    pub deadline: NaiveDate,
    pub manager_id: UserId,
}

// ---------------------------------------------------------------------------
// Membership
// ---------------------------------------------------------------------------

/// A user together with the role label they hold in one project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectMember {
    pub user: UserSummary,
    /// Free-text label such as "Developer" or "Tester".
    pub role: String,
    pub assigned_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// A task row joined with the names needed to display it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub project_name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: TaskStatus,
    pub assigned_to: Option<UserId>,
    pub assignee_name: Option<String>,
    /// Task that has to be finished before this one.
    pub dependency_id: Option<TaskId>,
    pub hours_worked: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub project_id: ProjectId,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: TaskStatus,
    pub assigned_to: Option<UserId>,
    pub dependency_id: Option<TaskId>,
    pub hours_worked: f64,
}

/// Optional criteria for [`Database::find_tasks`](crate::Database::find_tasks).
/// Unset fields match every task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub project: Option<ProjectId>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<UserId>,
}

impl TaskFilter {
    pub fn project(project: ProjectId) -> Self {
        Self {
            project: Some(project),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A project chat message joined with its sender's display name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub project_id: ProjectId,
    pub from_user: UserId,
    pub sender_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}
