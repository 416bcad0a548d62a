//! Run configuration.
//!
//! | variable | default | meaning |
//! |---|---|---|
//! | `VAXTRACK_DATABASE_URL` | `sqlite://database.db` | SQLite database backing the run |
//! | `VAXTRACK_ON_INSUFFICIENT` | `halt` | what to do when a send exceeds inventory |

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub const DATABASE_URL_ENV: &str = "VAXTRACK_DATABASE_URL";
pub const ON_INSUFFICIENT_ENV: &str = "VAXTRACK_ON_INSUFFICIENT";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://database.db";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid insufficient-inventory policy {0:?} (expected `halt` or `skip`)")]
    InvalidPolicy(String),
}

/// What the replay does with a send that exceeds on-hand inventory.
///
/// The event is rejected without mutation either way.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum InsufficientInventoryPolicy {
    /// Abort the run.
    #[default]
    Halt,
    /// Log a warning, write no line for the event and continue.
    Skip,
}

impl FromStr for InsufficientInventoryPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "halt" => Ok(Self::Halt),
            "skip" => Ok(Self::Skip),
            _ => Err(ConfigError::InvalidPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for InsufficientInventoryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Halt => "halt",
            Self::Skip => "skip",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub database_url: String,
    pub insufficient_inventory: InsufficientInventoryPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            insufficient_inventory: InsufficientInventoryPolicy::default(),
        }
    }
}

impl RunConfig {
    /// Defaults overridden by `VAXTRACK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(url) = lookup(DATABASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            config.database_url = url;
        }
        if let Some(policy) = lookup(ON_INSUFFICIENT_ENV) {
            config.insufficient_inventory = policy.parse()?;
        }
        Ok(config)
    }
}
