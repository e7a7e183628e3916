//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! { "lockTimeoutMs": 5000, "databaseFile": "moneytransfer.duckdb" }
//! ```
//! Both keys are optional. Keys this crate does not manage are ignored.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::result::{Error, Result};

pub const SETTINGS_FILE: &str = "settings.json";
pub const DEFAULT_DATABASE_FILE: &str = "moneytransfer.duckdb";
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;

/// Environment override for the lock timeout (CI, load tests)
pub const LOCK_TIMEOUT_ENV: &str = "MONEYTRANSFER_LOCK_TIMEOUT_MS";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    lock_timeout_ms: Option<u64>,
    #[serde(default)]
    database_file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// How long a transfer waits for its account locks before giving up
    pub lock_timeout: Duration,
    /// Database file name, relative to the data directory
    pub database_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS),
            database_file: DEFAULT_DATABASE_FILE.to_string(),
        }
    }
}

impl Config {
    /// Load config from the data directory
    ///
    /// A missing file yields defaults; a malformed one is an error rather
    /// than silently ignored. `MONEYTRANSFER_LOCK_TIMEOUT_MS` wins over the
    /// file.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let raw = read_settings(data_dir)?;
        let env_timeout = std::env::var(LOCK_TIMEOUT_ENV).ok();
        Self::from_parts(raw, env_timeout.as_deref())
    }

    fn from_parts(settings: SettingsFile, env_timeout: Option<&str>) -> Result<Self> {
        let defaults = Self::default();

        let lock_timeout_ms = match env_timeout {
            Some(value) => value.trim().parse::<u64>().map_err(|_| {
                Error::config(format!("{} must be milliseconds, got {:?}", LOCK_TIMEOUT_ENV, value))
            })?,
            None => settings.lock_timeout_ms.unwrap_or(DEFAULT_LOCK_TIMEOUT_MS),
        };
        if lock_timeout_ms == 0 {
            return Err(Error::config("lock timeout must be greater than zero"));
        }

        let database_file = settings.database_file.unwrap_or(defaults.database_file);
        if database_file.trim().is_empty() {
            return Err(Error::config("databaseFile cannot be empty"));
        }

        Ok(Self {
            lock_timeout: Duration::from_millis(lock_timeout_ms),
            database_file,
        })
    }
}

fn read_settings(data_dir: &Path) -> Result<SettingsFile> {
    let settings_path = data_dir.join(SETTINGS_FILE);
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(&settings_path)?;
    serde_json::from_str(&content)
        .map_err(|e| Error::config(format!("{}: {}", settings_path.display(), e)))
}
