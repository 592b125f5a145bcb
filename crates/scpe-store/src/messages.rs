use chrono::Utc;
use rusqlite::params;
use scpe_shared::{MessageId, ProjectId, UserId};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Message;
use crate::projects::reference_error;
use crate::row;

impl Database {
    /// Append a message to a project's conversation.
    pub fn post_message(&self, project: ProjectId, from_user: UserId, text: &str) -> Result<MessageId> {
        if text.trim().is_empty() {
            return Err(StoreError::EmptyMessage);
        }

        let id = self.write(|conn| {
            conn.execute(
                "INSERT INTO messages (project_id, from_user, message, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![project.0, from_user.0, text, row::timestamp(&Utc::now())],
            )
            .map_err(reference_error)?;
            Ok(MessageId(conn.last_insert_rowid()))
        })?;

        tracing::debug!(message_id = %id, project_id = %project, from_user = %from_user, "message posted");
        Ok(id)
    }

    /// Messages of a project, most recent first.
    pub fn list_messages(&self, project: ProjectId) -> Result<Vec<Message>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.project_id, m.from_user, u.full_name, m.message, m.created_at
                 FROM messages m
                 JOIN users u ON u.id = m.from_user
                 WHERE m.project_id = ?1
                 ORDER BY m.created_at DESC, m.id DESC",
            )?;

            let rows = stmt.query_map(params![project.0], row_to_message)?;

            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: MessageId(row.get(0)?),
        project_id: ProjectId(row.get(1)?),
        from_user: UserId(row.get(2)?),
        sender_name: row.get(3)?,
        text: row.get(4)?,
        created_at: row::get_timestamp(row, 5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[test]
    fn newest_first_with_sender_name() {
        let (_dir, db) = testutil::temp_db();
        let manager = testutil::manager(&db, "ana");
        let member = testutil::member(&db, "bruno");
        let project = testutil::project(&db, manager, "Portal");

        let first = db.post_message(project, manager, "kickoff on monday").unwrap();
        let second = db.post_message(project, member, "ok").unwrap();
        let third = db.post_message(project, manager, "agenda attached").unwrap();

        let messages = db.list_messages(project).unwrap();
        let ids: Vec<_> = messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![third, second, first]);
        assert_eq!(messages[1].sender_name, "bruno Full");
        assert_eq!(messages[1].text, "ok");
        assert!(messages[0].created_at >= messages[2].created_at);
    }

    #[test]
    fn empty_message_rejected() {
        let (_dir, db) = testutil::temp_db();
        let manager = testutil::manager(&db, "ana");
        let project = testutil::project(&db, manager, "Portal");
        db.post_message(project, manager, "hello").unwrap();

        assert!(matches!(db.post_message(project, manager, ""), Err(StoreError::EmptyMessage)));
        assert!(matches!(
            db.post_message(project, manager, "  \n"),
            Err(StoreError::EmptyMessage)
        ));
        assert_eq!(db.list_messages(project).unwrap().len(), 1);
    }

    #[test]
    fn messages_scoped_to_project() {
        let (_dir, db) = testutil::temp_db();
        let manager = testutil::manager(&db, "ana");
        let a = testutil::project(&db, manager, "A");
        let b = testutil::project(&db, manager, "B");

        db.post_message(a, manager, "for A").unwrap();
        assert_eq!(db.list_messages(a).unwrap().len(), 1);
        assert!(db.list_messages(b).unwrap().is_empty());
    }

    #[test]
    fn unknown_project_rejected() {
        let (_dir, db) = testutil::temp_db();
        let manager = testutil::manager(&db, "ana");

        assert!(matches!(
            db.post_message(ProjectId(3), manager, "hi"),
            Err(StoreError::UnknownReference)
        ));
    }
}
