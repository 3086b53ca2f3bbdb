//! Adapter options and the CLI configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default busy timeout for SQLite sessions, in milliseconds.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Connection options for [`crate::storage::SqliteDatabase`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteOptions {
    /// Opens the connection read-only.
    pub read_only: bool,
    /// Creates the database file when it does not exist. Ignored when read-only.
    pub create_if_missing: bool,
    /// How long a statement waits on a locked database. Zero disables waiting.
    pub busy_timeout_ms: u64,
    /// Lists SQLite's internal `sqlite_*` tables in the catalog.
    pub include_system_tables: bool,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            read_only: false,
            create_if_missing: true,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            include_system_tables: false,
        }
    }
}

impl SqliteOptions {
    /// Read-only options that never create a file.
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            create_if_missing: false,
            ..Self::default()
        }
    }
}

/// Failures loading the CLI configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read CLI config {path}: {source}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not valid TOML for [`CliConfig`].
    #[error("failed to parse CLI config {path}: {source}")]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Underlying parse error.
        source: toml::de::Error,
    },
}

/// Settings read from `cli.toml`.
///
/// ```toml
/// log_level = "debug"
///
/// [database]
/// default = "sqlite://data/app.db"
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default)]
    database: DatabaseSection,
    #[serde(default)]
    log_level: Option<String>,
    #[serde(skip)]
    path: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
struct DatabaseSection {
    #[serde(rename = "default")]
    default_uri: Option<String>,
}

impl CliConfig {
    /// Loads `explicit`, or the default location when `None`.
    ///
    /// A missing file yields the empty configuration.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = explicit.or_else(default_config_path);
        let mut config = match path.as_deref() {
            Some(file) if file.exists() => read_file(file)?,
            _ => Self::default(),
        };
        config.path = path;
        Ok(config)
    }

    /// Database URI used when `--database` is not given.
    pub fn default_database(&self) -> Option<&str> {
        self.database.default_uri.as_deref()
    }

    /// Log filter used when `--log-level` is not given.
    pub fn log_level(&self) -> Option<&str> {
        self.log_level.as_deref()
    }

    /// File this configuration was looked up at.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn read_file(path: &Path) -> Result<CliConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// `<config dir>/tether/cli.toml`, when the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| {
        base.join("tether").join("cli.toml")
    })
}
