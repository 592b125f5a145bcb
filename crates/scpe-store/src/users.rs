//! Registration, authentication and user lookups.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use scpe_shared::password;
use scpe_shared::UserId;

use crate::database::Database;
use crate::error::{is_unique_violation, not_found, Result, StoreError};
use crate::models::{NewUser, User, UserSummary};
use crate::row;

const USER_COLUMNS: &str = "id, username, email, role, full_name, created_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Register a new account.
    ///
    /// Fails with [`StoreError::DuplicateUsername`] when the name is taken;
    /// the existing account is left untouched.
    pub fn create_user(&self, user: &NewUser) -> Result<UserId> {
        require_text("username", &user.username)?;
        require_text("full name", &user.full_name)?;
        if !password::is_phc_string(&user.password_hash) {
            return Err(StoreError::Validation(
                "password hash must be a PHC string".to_string(),
            ));
        }

        let id = self.write(|conn| {
            conn.execute(
                "INSERT INTO users (username, password_hash, email, role, full_name, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    user.username,
                    user.password_hash,
                    user.email,
                    user.role.as_str(),
                    user.full_name,
                    row::timestamp(&Utc::now()),
                ],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::DuplicateUsername(user.username.clone())
                } else {
                    StoreError::Unavailable(e)
                }
            })?;
            Ok(UserId(conn.last_insert_rowid()))
        });

        match &id {
            Ok(id) => tracing::debug!(user_id = %id, username = %user.username, "user registered"),
            Err(StoreError::DuplicateUsername(name)) => {
                tracing::warn!(username = %name, "registration rejected: username taken")
            }
            Err(_) => {}
        }
        id
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Check a username / password pair.
    ///
    /// Returns `None` for an unknown username as well as for a wrong
    /// password, so callers cannot tell the two apart.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        let found = self.read(|conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE username = ?1"),
                params![username],
                |row| Ok((row_to_user(row)?, row.get::<_, String>(6)?)),
            )
            .optional()
            .map_err(StoreError::Unavailable)
        })?;

        let Some((user, stored_hash)) = found else {
            return Ok(None);
        };

        if password::verify_password(password, &stored_hash)? {
            Ok(Some(user))
        } else {
            tracing::debug!(username = %username, "authentication failed");
            Ok(None)
        }
    }

    /// Fetch a single user by id.
    pub fn get_user(&self, id: UserId) -> Result<User> {
        self.read(|conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id.0],
                row_to_user,
            )
            .map_err(not_found)
        })
    }

    /// List every account, ordered by id.
    pub fn list_users(&self) -> Result<Vec<UserSummary>> {
        self.read(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, username, full_name, role FROM users ORDER BY id ASC")?;
            let rows = stmt.query_map([], row_to_summary)?;
            rows.collect::<std::result::Result<Vec<_>, _>>()
                .map_err(StoreError::Unavailable)
        })
    }
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StoreError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map the columns of [`USER_COLUMNS`] to a [`User`].
fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId(row.get(0)?),
        username: row.get(1)?,
        email: row.get(2)?,
        role: row::get_parsed(row, 3)?,
        full_name: row.get(4)?,
        created_at: row::get_timestamp(row, 5)?,
    })
}

/// Map `id, username, full_name, role` to a [`UserSummary`].
pub(crate) fn row_to_summary(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserSummary> {
    Ok(UserSummary {
        id: UserId(row.get(0)?),
        username: row.get(1)?,
        full_name: row.get(2)?,
        role: row::get_parsed(row, 3)?,
    })
}
