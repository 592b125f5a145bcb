//! Store-level settings.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use scpe_shared::constants::DEFAULT_BUSY_TIMEOUT_MS;
use serde::{Deserialize, Serialize};

/// What happens to memberships, tasks and messages when their project is
/// deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Refuse to delete a project that still has dependent rows.
    #[default]
    Restrict,
    /// Delete dependent rows together with the project.
    Cascade,
}

impl FromStr for OrphanPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "restrict" => Ok(Self::Restrict),
            "cascade" => Ok(Self::Cascade),
            other => Err(format!("unknown orphan policy: {other}")),
        }
    }
}

impl fmt::Display for OrphanPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Restrict => f.write_str("restrict"),
            Self::Cascade => f.write_str("cascade"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// How long a single operation waits on a locked database before failing
    /// with [`StoreError::Unavailable`](crate::StoreError::Unavailable).
    pub busy_timeout: Duration,

    pub orphan_policy: OrphanPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
            orphan_policy: OrphanPolicy::default(),
        }
    }
}
