//! Database migration runner.
//!
//! Migrations are executed in order when a [`Database`](crate::Database) is
//! opened. Each migration is guarded by the `user_version` pragma so it runs
//! exactly once, and all pending migrations run inside one transaction: the
//! schema is either fully upgraded or left untouched.

pub mod v001_initial;
pub mod v002_lookup_indexes;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.  Bump this and add a new migration module whenever
/// the schema changes.
pub const CURRENT_VERSION: u32 = 2;

type Migration = fn(&Connection) -> std::result::Result<(), rusqlite::Error>;

const MIGRATIONS: [(u32, &str, Migration); 2] = [
    (1, "v001_initial", v001_initial::up),
    (2, "v002_lookup_indexes", v002_lookup_indexes::up),
];

/// Run all pending migrations against the open connection.
///
/// The function reads `PRAGMA user_version` to determine which migrations have
/// already been applied, then executes any outstanding ones in order.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    let current: u32 = tx.pragma_query_value(None, "user_version", |row| row.get(0))?;

    tracing::info!(
        current_version = current,
        target_version = CURRENT_VERSION,
        "checking database migrations"
    );

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {current} is newer than supported version {CURRENT_VERSION}"
        )));
    }

    for (version, name, up) in MIGRATIONS {
        if current < version {
            tracing::info!(migration = name, "applying migration");
            up(&tx).map_err(|e| StoreError::Migration(format!("{name}: {e}")))?;
            tx.pragma_update(None, "user_version", version)?;
        }
    }

    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_version(conn: &Connection) -> u32 {
        conn.pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_fresh_database_reaches_current_version() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        assert_eq!(user_version(&conn), CURRENT_VERSION);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        run_migrations(&mut conn).unwrap();
        assert_eq!(user_version(&conn), CURRENT_VERSION);
    }

    #[test]
    fn test_newer_schema_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", CURRENT_VERSION + 1)
            .unwrap();

        let err = run_migrations(&mut conn).unwrap_err();
        assert!(matches!(err, StoreError::Migration(_)));
    }

    #[test]
    fn test_failed_migration_leaves_no_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        // a clashing object makes v002 fail after v001 has run
        conn.execute_batch("CREATE TABLE idx_tasks_project (x INTEGER);")
            .unwrap();

        assert!(run_migrations(&mut conn).is_err());
        assert_eq!(user_version(&conn), 0);

        let users: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 'users'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(users, 0);
    }
}
