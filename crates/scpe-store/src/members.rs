//! Project membership: who takes part in which project, and in what role.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use scpe_shared::{ProjectId, UserId};

use crate::database::Database;
use crate::error::{is_unique_violation, Result, StoreError};
use crate::models::ProjectMember;
use crate::projects::reference_error;
use crate::row;
use crate::users::{require_text, row_to_summary};

impl Database {
    /// Members of a project ordered by full name.
    ///
    /// Only membership rows are returned: the project's manager appears only
    /// if they were added explicitly.  An unknown project yields an empty
    /// list.
    pub fn get_project_members(&self, project: ProjectId) -> Result<Vec<ProjectMember>> {
        self.read(|conn| query_members(conn, project))
    }

    pub fn is_member(&self, project: ProjectId, user: UserId) -> Result<bool> {
        self.read(|conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM project_members WHERE project_id = ?1 AND user_id = ?2",
                    params![project.0, user.0],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    /// Add `user` to `project` with a free-text role label.
    ///
    /// The (project, user) primary key makes this atomic: of two concurrent
    /// adds for the same pair exactly one succeeds, the other fails with
    /// [`StoreError::AlreadyMember`] and the first role is kept.
    pub fn add_member(&self, project: ProjectId, user: UserId, role: &str) -> Result<()> {
        require_text("membership role", role)?;

        let result = self.write(|conn| {
            conn.execute(
                "INSERT INTO project_members (project_id, user_id, role, assigned_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![project.0, user.0, role, row::timestamp(&Utc::now())],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::AlreadyMember {
                        project_id: project,
                        user_id: user,
                    }
                } else {
                    reference_error(e)
                }
            })?;
            Ok(())
        });

        match &result {
            Ok(()) => tracing::debug!(project_id = %project, user_id = %user, role, "member added"),
            Err(StoreError::AlreadyMember { .. }) => {
                tracing::warn!(project_id = %project, user_id = %user, "member already present")
            }
            Err(_) => {}
        }
        result
    }

    /// Remove `user` from `project`.  Removing a non-member is a no-op;
    /// returns `true` if a row was deleted.
    pub fn remove_member(&self, project: ProjectId, user: UserId) -> Result<bool> {
        let affected = self.write(|conn| {
            conn.execute(
                "DELETE FROM project_members WHERE project_id = ?1 AND user_id = ?2",
                params![project.0, user.0],
            )
            .map_err(StoreError::Unavailable)
        })?;

        tracing::debug!(project_id = %project, user_id = %user, removed = affected > 0, "member removed");
        Ok(affected > 0)
    }
}

pub(crate) fn query_members(conn: &Connection, project: ProjectId) -> Result<Vec<ProjectMember>> {
    let mut stmt = conn.prepare(
        "SELECT u.id, u.username, u.full_name, u.role, pm.role, pm.assigned_at
         FROM project_members pm
         JOIN users u ON u.id = pm.user_id
         WHERE pm.project_id = ?1
         ORDER BY u.full_name ASC, u.id ASC",
    )?;

    let rows = stmt.query_map(params![project.0], |row| {
        Ok(ProjectMember {
            user: row_to_summary(row)?,
            role: row.get(4)?,
            assigned_at: row::get_timestamp(row, 5)?,
        })
    })?;

    let mut members = Vec::new();
    for row in rows {
        members.push(row?);
    }
    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[test]
    fn manager_not_listed_unless_added() {
        let (_dir, db) = testutil::temp_db();
        let manager = testutil::manager(&db, "marta");
        let member = testutil::member(&db, "ulisses");
        let project = testutil::project(&db, manager, "Portal");

        db.add_member(project, member, "Developer").unwrap();

        let members = db.get_project_members(project).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].user.id, member);
        assert_eq!(members[0].role, "Developer");

        let visible: Vec<_> = db
            .list_projects(Some(member))
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(visible, vec![project]);
    }

    #[test]
    fn members_sorted_by_full_name() {
        let (_dir, db) = testutil::temp_db();
        let manager = testutil::manager(&db, "ana");
        let project = testutil::project(&db, manager, "Portal");
        let zeca = testutil::member(&db, "zeca");
        let bia = testutil::member(&db, "bia");

        db.add_member(project, zeca, "Tester").unwrap();
        db.add_member(project, bia, "Designer").unwrap();

        let names: Vec<_> = db
            .get_project_members(project)
            .unwrap()
            .into_iter()
            .map(|m| m.user.username)
            .collect();
        assert_eq!(names, vec!["bia", "zeca"]);
    }

    #[test]
    fn duplicate_add_keeps_first_role() {
        let (_dir, db) = testutil::temp_db();
        let manager = testutil::manager(&db, "ana");
        let member = testutil::member(&db, "bruno");
        let project = testutil::project(&db, manager, "Portal");

        db.add_member(project, member, "Developer").unwrap();
        let err = db.add_member(project, member, "Tester").unwrap_err();

        assert!(matches!(
            err,
            StoreError::AlreadyMember { project_id, user_id }
                if project_id == project && user_id == member
        ));
        let members = db.get_project_members(project).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].role, "Developer");
    }

    #[test]
    fn concurrent_adds_for_same_pair_admit_one() {
        let (_dir, db) = testutil::temp_db();
        let manager = testutil::manager(&db, "ana");
        let member = testutil::member(&db, "bruno");
        let project = testutil::project(&db, manager, "Portal");

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let db = db.clone();
                std::thread::spawn(move || db.add_member(project, member, &format!("Role {i}")))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, StoreError::AlreadyMember { .. })));
        assert_eq!(db.get_project_members(project).unwrap().len(), 1);
    }

    #[test]
    fn remove_non_member_is_noop() {
        let (_dir, db) = testutil::temp_db();
        let manager = testutil::manager(&db, "ana");
        let member = testutil::member(&db, "bruno");
        let stranger = testutil::member(&db, "carla");
        let project = testutil::project(&db, manager, "Portal");
        db.add_member(project, member, "Developer").unwrap();

        assert!(!db.remove_member(project, stranger).unwrap());
        assert_eq!(db.get_project_members(project).unwrap().len(), 1);

        assert!(db.remove_member(project, member).unwrap());
        assert!(!db.is_member(project, member).unwrap());
        assert!(db.get_project_members(project).unwrap().is_empty());
    }

    #[test]
    fn unknown_project_has_no_members() {
        let (_dir, db) = testutil::temp_db();
        assert!(db.get_project_members(ProjectId(7)).unwrap().is_empty());
    }

    #[test]
    fn add_to_unknown_project_or_user_rejected() {
        let (_dir, db) = testutil::temp_db();
        let manager = testutil::manager(&db, "ana");
        let project = testutil::project(&db, manager, "Portal");

        assert!(matches!(
            db.add_member(ProjectId(99), manager, "Lead"),
            Err(StoreError::UnknownReference)
        ));
        assert!(matches!(
            db.add_member(project, UserId(99), "Lead"),
            Err(StoreError::UnknownReference)
        ));
    }
}
