//! Database location and per-operation connection management.
//!
//! [`Database`] does not keep a connection open between calls. Every
//! operation opens its own [`rusqlite::Connection`], configures it, runs its
//! statements inside a single transaction and drops everything before
//! returning. A transaction that is not committed rolls back when dropped,
//! so an early `?` return never leaves partial writes behind.
//!
//! Migrations are run once, when the handle is created.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use rusqlite::{Connection, TransactionBehavior};
use scpe_shared::constants::DB_FILE_NAME;

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::migrations;

/// Handle to an SQLite project database.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
    config: StoreConfig,
}

impl Database {
    /// Open (or create) the default application database.
    ///
    /// The database file is placed in the platform-appropriate data directory:
    /// - Linux:   `~/.local/share/scpe/scpe.db`
    /// - macOS:   `~/Library/Application Support/br.scpe.scpe/scpe.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\scpe\scpe\data\scpe.db`
    pub fn new(config: StoreConfig) -> Result<Self> {
        let db_path = default_path()?;
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Self::open_at(&db_path, config)
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path, config: StoreConfig) -> Result<Self> {
        tracing::info!(path = %path.display(), "opening database");

        let mut conn = connect(path, &config)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        migrations::run_migrations(&mut conn)?;

        Ok(Self {
            path: path.to_path_buf(),
            config,
        })
    }

    /// Filesystem path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Run `f` in a deferred (read) transaction on a fresh connection.
    pub(crate) fn read<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        self.unit_of_work(TransactionBehavior::Deferred, f)
    }

    /// Run `f` in an immediate (write) transaction on a fresh connection and
    /// commit if it succeeds.
    pub(crate) fn write<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        self.unit_of_work(TransactionBehavior::Immediate, f)
    }

    fn unit_of_work<T>(
        &self,
        behavior: TransactionBehavior,
        f: impl FnOnce(&Connection) -> Result<T>,
    ) -> Result<T> {
        let mut conn = connect(&self.path, &self.config)?;
        let tx = conn.transaction_with_behavior(behavior)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

/// Default database location inside the platform data directory.
pub fn default_path() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("br", "scpe", "scpe").ok_or(StoreError::NoDataDir)?;
    Ok(project_dirs.data_dir().join(DB_FILE_NAME))
}

fn connect(path: &Path, config: &StoreConfig) -> Result<Connection> {
    let conn = Connection::open(path)?;

    // foreign_keys is per connection and ignored inside a transaction
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(config.busy_timeout)?;

    Ok(conn)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testutil;

    #[test]
    fn open_creates_schema() {
        let (_dir, db) = testutil::temp_db();

        let tables: Vec<String> = db
            .read(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(StoreError::Unavailable)
            })
            .unwrap();

        for expected in ["messages", "project_members", "projects", "tasks", "users"] {
            assert!(tables.iter().any(|t| t == expected), "missing table {expected}");
        }
    }

    #[test]
    fn reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");

        let db = Database::open_at(&path, StoreConfig::default()).unwrap();
        let manager = testutil::manager(&db, "ana");
        drop(db);

        let db = Database::open_at(&path, StoreConfig::default()).expect("should reopen");
        assert_eq!(db.get_user(manager).unwrap().username, "ana");
    }

    #[test]
    fn failed_unit_of_work_rolls_back() {
        let (_dir, db) = testutil::temp_db();
        let manager = testutil::manager(&db, "ana");

        let result: Result<()> = db.write(|conn| {
            conn.execute(
                "UPDATE users SET full_name = 'changed' WHERE id = ?1",
                [manager.0],
            )?;
            Err(StoreError::NotFound)
        });

        assert!(matches!(result, Err(StoreError::NotFound)));
        assert_eq!(db.get_user(manager).unwrap().full_name, "ana Full");
    }

    #[test]
    fn locked_database_is_unavailable() {
        let (_dir, db) = testutil::temp_db_with(StoreConfig {
            busy_timeout: Duration::from_millis(50),
            ..StoreConfig::default()
        });
        let manager = testutil::manager(&db, "ana");
        let member = testutil::member(&db, "bruno");
        let project = testutil::project(&db, manager, "Portal");

        let holder = Connection::open(db.path()).unwrap();
        holder.execute_batch("BEGIN EXCLUSIVE").unwrap();

        let result = db.remove_member(project, member);
        assert!(
            matches!(result, Err(StoreError::Unavailable(_))),
            "expected Unavailable, got {result:?}"
        );

        holder.execute_batch("ROLLBACK").unwrap();
        assert!(!db.remove_member(project, member).unwrap());
    }

    #[test]
    fn directory_path_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();

        let result = Database::open_at(dir.path(), StoreConfig::default());
        assert!(
            matches!(result, Err(StoreError::Unavailable(_))),
            "expected Unavailable, got {result:?}"
        );
    }

    #[test]
    fn foreign_keys_enforced_on_every_connection() {
        let (_dir, db) = testutil::temp_db();

        let enabled: i64 = db
            .read(|conn| {
                conn.pragma_query_value(None, "foreign_keys", |row| row.get(0))
                    .map_err(StoreError::Unavailable)
            })
            .unwrap();
        assert_eq!(enabled, 1);
    }
}
