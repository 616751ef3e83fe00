use std::path::{Path, PathBuf};

use crate::{AppError, AppResult};

/// Overrides the application data directory. Used by tests and scripted runs.
pub const FAKE_APPDATA_ENV: &str = "PHONEBOOK_FAKE_APPDATA";
pub const LOG_FILTER_ENV: &str = "PHONEBOOK_LOG";
pub const LOG_MAX_SIZE_ENV: &str = "PHONEBOOK_LOG_MAX_SIZE_BYTES";
pub const LOG_MAX_FILES_ENV: &str = "PHONEBOOK_LOG_MAX_FILES";

pub const APP_DIR_NAME: &str = "phonebook";
pub const DB_FILE_NAME: &str = "phonebook.sqlite3";

const DEFAULT_LOG_FILTER: &str = "phonebook=info,sqlx=warn";
const DEFAULT_LOG_MAX_SIZE_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_LOG_MAX_FILES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub logs_dir: PathBuf,
}

impl AppPaths {
    /// Resolve where the database and logs live. An explicit database path
    /// wins; otherwise the fake appdata override, then the platform data dir.
    pub fn resolve(db_override: Option<&Path>) -> AppResult<Self> {
        let data_dir = match std::env::var_os(FAKE_APPDATA_ENV) {
            Some(fake) => PathBuf::from(fake),
            None => dirs::data_dir()
                .or_else(|| std::env::current_dir().ok())
                .map(|base| base.join(APP_DIR_NAME))
                .ok_or_else(|| {
                    AppError::new(
                        "CONFIG/NO_DATA_DIR",
                        "Failed to resolve the application data directory.",
                    )
                })?,
        };

        let db_path = match db_override {
            Some(path) => path.to_path_buf(),
            None => data_dir.join(DB_FILE_NAME),
        };

        Ok(Self {
            logs_dir: data_dir.join("logs"),
            data_dir,
            db_path,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub filter: String,
    pub max_size_bytes: usize,
    pub max_files: usize,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self {
            filter: std::env::var(LOG_FILTER_ENV)
                .ok()
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            max_size_bytes: env_usize(LOG_MAX_SIZE_ENV).unwrap_or(DEFAULT_LOG_MAX_SIZE_BYTES),
            max_files: env_usize(LOG_MAX_FILES_ENV).unwrap_or(DEFAULT_LOG_MAX_FILES),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            max_size_bytes: DEFAULT_LOG_MAX_SIZE_BYTES,
            max_files: DEFAULT_LOG_MAX_FILES,
        }
    }
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|value| *value > 0)
}
