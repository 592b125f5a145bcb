/// Database file name inside the data directory
pub const DB_FILE_NAME: &str = "scpe.db";

/// Argon2 salt length in bytes
pub const SALT_SIZE: usize = 16;

/// Default busy timeout for a single store operation, in milliseconds
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Window used by the dashboard's "due soon" list, in days
pub const UPCOMING_TASK_HORIZON_DAYS: i64 = 7;
