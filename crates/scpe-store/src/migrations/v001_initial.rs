//! v001 -- Initial schema creation.
//!
//! Creates the five core tables: `users`, `projects`, `project_members`,
//! `tasks` and `messages`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,              -- Argon2id PHC string
    email         TEXT NOT NULL,
    role          TEXT NOT NULL CHECK (role IN ('manager', 'member')),
    full_name     TEXT NOT NULL,
    created_at    TEXT NOT NULL               -- RFC-3339, UTC
);

-- ----------------------------------------------------------------
-- Projects
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS projects (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    client      TEXT NOT NULL,
    budget      REAL NOT NULL DEFAULT 0 CHECK (budget >= 0),
    deadline    TEXT NOT NULL,                -- YYYY-MM-DD
    manager_id  INTEGER NOT NULL,
    status      TEXT NOT NULL DEFAULT 'active',
    created_at  TEXT NOT NULL,

    FOREIGN KEY (manager_id) REFERENCES users(id)
);

-- ----------------------------------------------------------------
-- Project membership
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS project_members (
    project_id  INTEGER NOT NULL,
    user_id     INTEGER NOT NULL,
    role        TEXT NOT NULL,                -- free-text label, e.g. "Developer"
    assigned_at TEXT NOT NULL,

    PRIMARY KEY (project_id, user_id),
    FOREIGN KEY (project_id) REFERENCES projects(id),
    FOREIGN KEY (user_id) REFERENCES users(id)
);

-- ----------------------------------------------------------------
-- Tasks
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS tasks (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id    INTEGER NOT NULL,
    description   TEXT NOT NULL,
    start_date    TEXT NOT NULL,              -- YYYY-MM-DD
    end_date      TEXT NOT NULL,              -- YYYY-MM-DD
    status        TEXT NOT NULL DEFAULT 'pending',
    assigned_to   INTEGER,
    dependency_id INTEGER,
    hours_worked  REAL NOT NULL DEFAULT 0 CHECK (hours_worked >= 0),
    created_at    TEXT NOT NULL,

    FOREIGN KEY (project_id) REFERENCES projects(id),
    FOREIGN KEY (assigned_to) REFERENCES users(id),
    FOREIGN KEY (dependency_id) REFERENCES tasks(id) ON DELETE SET NULL
);

-- ----------------------------------------------------------------
-- Messages
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    from_user  INTEGER NOT NULL,
    message    TEXT NOT NULL,
    created_at TEXT NOT NULL,

    FOREIGN KEY (project_id) REFERENCES projects(id),
    FOREIGN KEY (from_user) REFERENCES users(id)
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
