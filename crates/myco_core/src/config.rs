//! Runtime configuration resolved from the process environment.
//!
//! # Responsibility
//! - Decide where the experiment database lives and how logging starts.
//!
//! # Invariants
//! - Blank environment values are treated as unset.
//! - Resolution never fails; unusable values surface later when the
//!   database or logger is opened.

use crate::logging::default_log_level;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "MYCO_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "MYCO_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "MYCO_LOG_DIR";

/// Default database location relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "data/mushroom_tracker.db";

/// Core settings for host applications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging stays off when unset.
    pub log_dir: Option<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Reads `MYCO_DB_PATH`, `MYCO_LOG_LEVEL` and `MYCO_LOG_DIR`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();
        Self {
            db_path: read(DB_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            log_level: read(LOG_LEVEL_ENV).unwrap_or(defaults.log_level),
            log_dir: read(LOG_DIR_ENV),
        }
    }
}
