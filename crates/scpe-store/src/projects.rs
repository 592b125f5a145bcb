//! CRUD operations for [`Project`] records.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use scpe_shared::{ProjectId, ProjectStatus, UserId};

use crate::config::OrphanPolicy;
use crate::database::Database;
use crate::error::{is_foreign_key_violation, not_found, Result, StoreError};
use crate::models::{NewProject, Project};
use crate::row;
use crate::users::require_text;

const PROJECT_SELECT: &str = "SELECT p.id, p.name, p.description, p.client, p.budget, p.deadline,
        p.manager_id, u.full_name, p.status, p.created_at
 FROM projects p
 LEFT JOIN users u ON u.id = p.manager_id";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new project owned by `project.manager_id`.  The status starts
    /// as [`ProjectStatus::Active`].
    pub fn create_project(&self, project: &NewProject) -> Result<ProjectId> {
        require_text("project name", &project.name)?;
        require_text("client", &project.client)?;
        if !project.budget.is_finite() || project.budget < 0.0 {
            return Err(StoreError::Validation(
                "budget must be a non-negative number".to_string(),
            ));
        }

        let id = self.write(|conn| {
            conn.execute(
                "INSERT INTO projects (name, description, client, budget, deadline, manager_id, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    project.name,
                    project.description,
                    project.client,
                    project.budget,
                    row::date(&project.deadline),
                    project.manager_id.0,
                    ProjectStatus::Active.as_str(),
                    row::timestamp(&Utc::now()),
                ],
            )
            .map_err(reference_error)?;
            Ok(ProjectId(conn.last_insert_rowid()))
        })?;

        tracing::debug!(project_id = %id, manager_id = %project.manager_id, "project created");
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_project(&self, id: ProjectId) -> Result<Project> {
        self.read(|conn| fetch_project(conn, id))
    }

    /// List projects ordered by id.
    ///
    /// With `Some(user)`, only projects the user manages or is a member of
    /// are returned, each exactly once.
    pub fn list_projects(&self, user: Option<UserId>) -> Result<Vec<Project>> {
        self.read(|conn| query_projects(conn, user))
    }

    /// Whether `user` takes part in `project`, either as its manager or
    /// through a membership row.
    pub fn can_access_project(&self, project: ProjectId, user: UserId) -> Result<bool> {
        self.read(|conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM projects p
                     WHERE p.id = ?1
                       AND (p.manager_id = ?2
                            OR EXISTS (SELECT 1 FROM project_members m
                                       WHERE m.project_id = p.id AND m.user_id = ?2))",
                    params![project.0, user.0],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    pub fn set_project_status(&self, id: ProjectId, status: ProjectStatus) -> Result<()> {
        let affected = self.write(|conn| {
            conn.execute(
                "UPDATE projects SET status = ?1 WHERE id = ?2",
                params![status.as_str(), id.0],
            )
            .map_err(StoreError::Unavailable)
        })?;

        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        tracing::debug!(project_id = %id, status = %status, "project status changed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a project.
    ///
    /// What happens to its memberships, tasks and messages is decided by
    /// [`StoreConfig::orphan_policy`](crate::StoreConfig::orphan_policy).
    pub fn delete_project(&self, id: ProjectId) -> Result<()> {
        let policy = self.config().orphan_policy;

        self.write(|conn| {
            conn.query_row("SELECT 1 FROM projects WHERE id = ?1", params![id.0], |_| Ok(()))
                .map_err(not_found)?;

            let dependents: i64 = conn.query_row(
                "SELECT (SELECT COUNT(*) FROM project_members WHERE project_id = ?1)
                      + (SELECT COUNT(*) FROM tasks WHERE project_id = ?1)
                      + (SELECT COUNT(*) FROM messages WHERE project_id = ?1)",
                params![id.0],
                |row| row.get(0),
            )?;

            match policy {
                OrphanPolicy::Restrict if dependents > 0 => {
                    return Err(StoreError::HasDependents(id));
                }
                OrphanPolicy::Restrict => {}
                OrphanPolicy::Cascade => {
                    conn.execute("DELETE FROM messages WHERE project_id = ?1", params![id.0])?;
                    conn.execute("DELETE FROM tasks WHERE project_id = ?1", params![id.0])?;
                    conn.execute(
                        "DELETE FROM project_members WHERE project_id = ?1",
                        params![id.0],
                    )?;
                }
            }

            conn.execute("DELETE FROM projects WHERE id = ?1", params![id.0])
                .map_err(|e| {
                    if is_foreign_key_violation(&e) {
                        StoreError::HasDependents(id)
                    } else {
                        StoreError::Unavailable(e)
                    }
                })?;
            Ok(())
        })?;

        tracing::info!(project_id = %id, policy = %policy, "project deleted");
        Ok(())
    }
}

pub(crate) fn fetch_project(conn: &Connection, id: ProjectId) -> Result<Project> {
    conn.query_row(
        &format!("{PROJECT_SELECT} WHERE p.id = ?1"),
        params![id.0],
        row_to_project,
    )
    .map_err(not_found)
}

pub(crate) fn query_projects(conn: &Connection, user: Option<UserId>) -> Result<Vec<Project>> {
    let (sql, args) = match user {
        // IN (...) rather than a join keeps a manager who is also a member
        // from producing two rows
        Some(user) => (
            format!(
                "{PROJECT_SELECT}
                 WHERE p.manager_id = ?1
                    OR p.id IN (SELECT project_id FROM project_members WHERE user_id = ?1)
                 ORDER BY p.id ASC"
            ),
            vec![user.0],
        ),
        None => (format!("{PROJECT_SELECT} ORDER BY p.id ASC"), Vec::new()),
    };

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(args), row_to_project)?;

    let mut projects = Vec::new();
    for row in rows {
        projects.push(row?);
    }
    Ok(projects)
}

/// Foreign-key failures on insert mean the caller referenced a missing row.
pub(crate) fn reference_error(err: rusqlite::Error) -> StoreError {
    if is_foreign_key_violation(&err) {
        StoreError::UnknownReference
    } else {
        StoreError::Unavailable(err)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn row_to_project(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: ProjectId(row.get(0)?),
        name: row.get(1)?,
        description: row.get(2)?,
        client: row.get(3)?,
        budget: row.get(4)?,
        deadline: row::get_date(row, 5)?,
        manager_id: UserId(row.get(6)?),
        manager_name: row.get(7)?,
        status: row::get_parsed(row, 8)?,
        created_at: row::get_timestamp(row, 9)?,
    })
}

#[cfg(test)]
mod tests {
    use scpe_shared::Role;

    use super::*;
    use crate::config::StoreConfig;
    use crate::testutil;

    #[test]
    fn create_and_get() {
        let (_dir, db) = testutil::temp_db();
        let manager = testutil::manager(&db, "ana");
        let id = testutil::project(&db, manager, "Portal");

        let project = db.get_project(id).unwrap();
        assert_eq!(project.name, "Portal");
        assert_eq!(project.client, "ACME");
        assert_eq!(project.manager_id, manager);
        assert_eq!(project.manager_name.as_deref(), Some("ana Full"));
        assert_eq!(project.status, ProjectStatus::Active);
        assert_eq!(project.deadline, testutil::date(2030, 12, 31));
    }

    #[test]
    fn unknown_manager_is_rejected() {
        let (_dir, db) = testutil::temp_db();
        let new = testutil::new_project(UserId(42), "Ghost");

        assert!(matches!(
            db.create_project(&new),
            Err(StoreError::UnknownReference)
        ));
        assert!(db.list_projects(None).unwrap().is_empty());
    }

    #[test]
    fn blank_name_or_negative_budget_rejected() {
        let (_dir, db) = testutil::temp_db();
        let manager = testutil::manager(&db, "ana");

        let mut blank = testutil::new_project(manager, "  ");
        assert!(matches!(db.create_project(&blank), Err(StoreError::Validation(_))));

        blank.name = "Ok".to_string();
        blank.budget = -1.0;
        assert!(matches!(db.create_project(&blank), Err(StoreError::Validation(_))));
    }

    #[test]
    fn list_projects_for_manager_and_member_has_no_duplicates() {
        let (_dir, db) = testutil::temp_db();
        let manager = testutil::manager(&db, "ana");
        let member = testutil::member(&db, "bruno");
        let outsider = testutil::member(&db, "carla");

        let managed = testutil::project(&db, manager, "Managed");
        let joined = testutil::project(&db, outsider, "Joined");
        testutil::project(&db, outsider, "Elsewhere");

        // manager is also added as a member of their own project
        db.add_member(managed, manager, "Lead").unwrap();
        db.add_member(joined, manager, "Reviewer").unwrap();
        db.add_member(managed, member, "Developer").unwrap();

        let ids: Vec<_> = db
            .list_projects(Some(manager))
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![managed, joined]);

        let ids: Vec<_> = db
            .list_projects(Some(member))
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![managed]);

        assert_eq!(db.list_projects(None).unwrap().len(), 3);
    }

    #[test]
    fn list_projects_is_stable() {
        let (_dir, db) = testutil::temp_db();
        let manager = testutil::manager(&db, "ana");
        for name in ["C", "A", "B"] {
            testutil::project(&db, manager, name);
        }

        let first = db.list_projects(None).unwrap();
        let second = db.list_projects(None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn manager_can_access_without_membership() {
        let (_dir, db) = testutil::temp_db();
        let manager = testutil::manager(&db, "ana");
        let member = testutil::member(&db, "bruno");
        let project = testutil::project(&db, manager, "Portal");

        assert!(db.can_access_project(project, manager).unwrap());
        assert!(!db.can_access_project(project, member).unwrap());

        db.add_member(project, member, "Developer").unwrap();
        assert!(db.can_access_project(project, member).unwrap());
    }

    #[test]
    fn set_status() {
        let (_dir, db) = testutil::temp_db();
        let manager = testutil::manager(&db, "ana");
        let project = testutil::project(&db, manager, "Portal");

        db.set_project_status(project, ProjectStatus::OnHold).unwrap();
        assert_eq!(db.get_project(project).unwrap().status, ProjectStatus::OnHold);

        assert!(matches!(
            db.set_project_status(ProjectId(999), ProjectStatus::Completed),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn restrict_policy_refuses_delete_with_dependents() {
        let (_dir, db) = testutil::temp_db();
        let manager = testutil::manager(&db, "ana");
        let member = testutil::user(&db, "bruno", Role::Member);
        let busy = testutil::project(&db, manager, "Busy");
        let empty = testutil::project(&db, manager, "Empty");
        db.add_member(busy, member, "Developer").unwrap();

        assert!(matches!(
            db.delete_project(busy),
            Err(StoreError::HasDependents(id)) if id == busy
        ));
        assert!(db.is_member(busy, member).unwrap());

        db.delete_project(empty).unwrap();
        assert!(matches!(db.get_project(empty), Err(StoreError::NotFound)));
        assert!(matches!(db.delete_project(empty), Err(StoreError::NotFound)));
    }

    #[test]
    fn cascade_policy_removes_dependents() {
        let config = StoreConfig {
            orphan_policy: OrphanPolicy::Cascade,
            ..StoreConfig::default()
        };
        let (_dir, db) = testutil::temp_db_with(config);
        let manager = testutil::manager(&db, "ana");
        let member = testutil::member(&db, "bruno");
        let doomed = testutil::project(&db, manager, "Doomed");
        let kept = testutil::project(&db, manager, "Kept");

        db.add_member(doomed, member, "Developer").unwrap();
        let first = db.create_task(&testutil::new_task(doomed)).unwrap();
        let mut dependent = testutil::new_task(doomed);
        dependent.dependency_id = Some(first);
        db.create_task(&dependent).unwrap();
        db.post_message(doomed, member, "bye").unwrap();
        db.create_task(&testutil::new_task(kept)).unwrap();

        db.delete_project(doomed).unwrap();

        assert!(matches!(db.get_project(doomed), Err(StoreError::NotFound)));
        assert!(db.get_project_members(doomed).unwrap().is_empty());
        assert!(db.list_tasks(Some(doomed)).unwrap().is_empty());
        assert!(db.list_messages(doomed).unwrap().is_empty());
        assert_eq!(db.list_tasks(None).unwrap().len(), 1);
    }
}
