//! CLI configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the tool works with zero
//! configuration.

use std::path::PathBuf;
use std::time::Duration;

use scpe_store::{OrphanPolicy, StoreConfig};

/// CLI configuration.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Database file.
    /// Env: `SCPE_DB_PATH`
    /// Default: `None`, meaning the platform data directory.
    pub db_path: Option<PathBuf>,

    pub store: StoreConfig,
}

impl CliConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("SCPE_DB_PATH") {
            if !path.is_empty() {
                config.db_path = Some(PathBuf::from(path));
            }
        }

        // Env: `SCPE_BUSY_TIMEOUT_MS`
        if let Some(val) = lookup("SCPE_BUSY_TIMEOUT_MS") {
            match val.parse::<u64>() {
                Ok(ms) => config.store.busy_timeout = Duration::from_millis(ms),
                Err(_) => tracing::warn!(value = %val, "Invalid SCPE_BUSY_TIMEOUT_MS, using default"),
            }
        }

        // Env: `SCPE_ORPHAN_POLICY` (restrict/cascade)
        if let Some(val) = lookup("SCPE_ORPHAN_POLICY") {
            match val.parse::<OrphanPolicy>() {
                Ok(policy) => config.store.orphan_policy = policy,
                Err(e) => tracing::warn!(error = %e, "Invalid SCPE_ORPHAN_POLICY, using default"),
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}
