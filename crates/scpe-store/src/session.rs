//! Explicit caller identity.
//!
//! The store keeps no notion of a "current user".  Callers authenticate once,
//! hold on to the resulting [`Session`] and pass it to the operations whose
//! result depends on who is asking.

use rusqlite::Connection;
use scpe_shared::{Role, UserId};
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Project, User};
use crate::projects::query_projects;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub user: User,
}

impl Session {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    pub fn user_id(&self) -> UserId {
        self.user.id
    }

    pub fn is_manager(&self) -> bool {
        self.user.role == Role::Manager
    }

    pub fn require_manager(&self) -> Result<()> {
        if self.is_manager() {
            Ok(())
        } else {
            Err(StoreError::Forbidden)
        }
    }

    /// `None` means "no restriction" (managers see everything).
    pub(crate) fn project_filter(&self) -> Option<UserId> {
        if self.is_manager() {
            None
        } else {
            Some(self.user.id)
        }
    }
}

impl Database {
    /// Authenticate and wrap the account in a [`Session`].
    pub fn login(&self, username: &str, password: &str) -> Result<Option<Session>> {
        let session = self.authenticate(username, password)?.map(Session::new);
        if let Some(session) = &session {
            tracing::info!(user_id = %session.user_id(), role = %session.user.role, "login");
        }
        Ok(session)
    }

    /// Projects the session may see: all of them for managers, the ones the
    /// user manages or belongs to for members.
    pub fn visible_projects(&self, session: &Session) -> Result<Vec<Project>> {
        self.read(|conn| visible_projects(conn, session))
    }
}

pub(crate) fn visible_projects(conn: &Connection, session: &Session) -> Result<Vec<Project>> {
    query_projects(conn, session.project_filter())
}
