//! Fixtures shared by the unit tests.

use chrono::NaiveDate;
use scpe_shared::password::{hash_password_with, insecure_test_params};
use scpe_shared::{ProjectId, Role, TaskStatus, UserId};
use tempfile::TempDir;

use crate::config::StoreConfig;
use crate::database::Database;
use crate::models::{NewProject, NewTask, NewUser};

pub const PASSWORD: &str = "correct horse battery";
pub const BUDGET: f64 = 15_000.0;

pub fn temp_db() -> (TempDir, Database) {
    temp_db_with(StoreConfig::default())
}

pub fn temp_db_with(config: StoreConfig) -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_at(&dir.path().join("test.db"), config).expect("should open");
    (dir, db)
}

/// Register `username` with [`PASSWORD`], `<username>@example.com` and
/// full name `"<username> Full"`.
pub fn user(db: &Database, username: &str, role: Role) -> UserId {
    db.create_user(&NewUser {
        username: username.to_string(),
        password_hash: hash_password_with(PASSWORD, insecure_test_params()).unwrap(),
        email: format!("{username}@example.com"),
        role,
        full_name: format!("{username} Full"),
    })
    .unwrap()
}

pub fn manager(db: &Database, username: &str) -> UserId {
    user(db, username, Role::Manager)
}

pub fn member(db: &Database, username: &str) -> UserId {
    user(db, username, Role::Member)
}

pub fn new_project(manager: UserId, name: &str) -> NewProject {
    NewProject {
        name: name.to_string(),
        description: format!("{name} description"),
        client: "ACME".to_string(),
        budget: BUDGET,
        deadline: date(2030, 12, 31),
        manager_id: manager,
    }
}

pub fn project(db: &Database, manager: UserId, name: &str) -> ProjectId {
    db.create_project(&new_project(manager, name)).unwrap()
}

/// A pending, unassigned task running through January 2024.
pub fn new_task(project: ProjectId) -> NewTask {
    NewTask {
        project_id: project,
        description: "Write the report".to_string(),
        start_date: date(2024, 1, 1),
        end_date: date(2024, 1, 31),
        status: TaskStatus::Pending,
        assigned_to: None,
        dependency_id: None,
        hours_worked: 0.0,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
