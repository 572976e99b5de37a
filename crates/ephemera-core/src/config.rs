//! Store configuration.
//!
//! Loaded from JSON; every field has a default so an empty object `{}` is a
//! valid config.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default session TTL: 30 minutes.
pub const DEFAULT_TTL_SECS: u64 = 30 * 60;

/// Default display-name cap, matching common filesystem limits.
pub const DEFAULT_MAX_NAME_BYTES: usize = 255;

/// Upper bound for `ttl_secs` and `tombstone_retention_secs`: one year.
pub const MAX_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

/// Upper bound for `tick_interval_ms`: one hour.
pub const MAX_TICK_INTERVAL_MS: u64 = 60 * 60 * 1_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} is {value}, maximum is {max}")]
    OutOfRange {
        field: &'static str,
        value: u64,
        max: u64,
    },
}

fn check_range(field: &'static str, value: u64, max: u64) -> Result<(), ConfigError> {
    if value > max {
        return Err(ConfigError::OutOfRange { field, value, max });
    }
    Ok(())
}

/// 秒数を chrono の Duration に変換（範囲外はパニックせずエラー）
fn seconds(field: &'static str, secs: u64) -> Result<chrono::Duration, ConfigError> {
    check_range(field, secs, MAX_DURATION_SECS)?;
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .ok_or(ConfigError::OutOfRange {
            field,
            value: secs,
            max: MAX_DURATION_SECS,
        })
}

/// Where artifact bytes are kept.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageConfig {
    #[default]
    Memory,
    Local {
        root: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Session time-to-live, counted from session creation. Not renewable.
    pub ttl_secs: u64,

    /// How often the expiry scheduler checks deadlines.
    pub tick_interval_ms: u64,

    /// Upper bound on a display name, in bytes, after the extension is added.
    pub max_name_bytes: usize,

    /// How long a purged session is remembered before the scheduler drops it.
    pub tombstone_retention_secs: u64,

    pub storage: StorageConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL_SECS,
            tick_interval_ms: 1_000,
            max_name_bytes: DEFAULT_MAX_NAME_BYTES,
            tombstone_retention_secs: 10 * 60,
            storage: StorageConfig::Memory,
        }
    }
}

impl StoreConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl_secs == 0 {
            return Err(ConfigError::Zero { field: "ttl_secs" });
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Zero {
                field: "tick_interval_ms",
            });
        }
        if self.max_name_bytes == 0 {
            return Err(ConfigError::Zero {
                field: "max_name_bytes",
            });
        }
        check_range("ttl_secs", self.ttl_secs, MAX_DURATION_SECS)?;
        check_range(
            "tombstone_retention_secs",
            self.tombstone_retention_secs,
            MAX_DURATION_SECS,
        )?;
        check_range(
            "tick_interval_ms",
            self.tick_interval_ms,
            MAX_TICK_INTERVAL_MS,
        )?;
        Ok(())
    }

    pub fn ttl(&self) -> Result<chrono::Duration, ConfigError> {
        seconds("ttl_secs", self.ttl_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.min(MAX_TICK_INTERVAL_MS))
    }

    pub fn tombstone_retention(&self) -> Result<chrono::Duration, ConfigError> {
        seconds("tombstone_retention_secs", self.tombstone_retention_secs)
    }
}
