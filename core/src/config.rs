//! Runtime configuration: where records live and how time is sliced.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, StoreError};

pub const HOME_ENV: &str = "CODETIME_HOME";
const DEFAULT_DIR_NAME: &str = ".codetime";

pub const DEFAULT_IDLE_THRESHOLD: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_IDLE_CHECK_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_STATUS_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct Config {
    /// Application storage root; records go in a subdirectory of it.
    pub storage_root: PathBuf,
    /// Longest gap between two activities that still counts as active time.
    pub idle_threshold: Duration,
    pub idle_check_interval: Duration,
    pub status_refresh_interval: Duration,
}

impl Config {
    /// Resolves the storage root from `CODETIME_HOME`, falling back to `~/.codetime`.
    pub fn from_env() -> Result<Self> {
        let storage_root = match env::var_os(HOME_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir()
                .ok_or(StoreError::HomeDirNotFound)?
                .join(DEFAULT_DIR_NAME),
        };
        Ok(Self::with_root(storage_root))
    }

    pub fn with_root(storage_root: PathBuf) -> Self {
        Self {
            storage_root,
            idle_threshold: DEFAULT_IDLE_THRESHOLD,
            idle_check_interval: DEFAULT_IDLE_CHECK_INTERVAL,
            status_refresh_interval: DEFAULT_STATUS_REFRESH_INTERVAL,
        }
    }
}
