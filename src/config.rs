//! Runtime configuration for the binary: where the database lives and how
//! chatty the logs are.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories::BaseDirs;
use tracing_subscriber::{fmt, EnvFilter};

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".school-records-manager";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "school_management.sqlite";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Fallback filter directive when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingConfig {
    /// Install the global tracing subscriber. Logs go to stderr so command
    /// output on stdout can be piped.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format {
            LogFormat::Json => {
                fmt()
                    .json()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
            LogFormat::Pretty => {
                fmt()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub logging: LoggingConfig,
}

impl Config {
    /// Build the configuration, falling back to the per-user database file
    /// when no explicit path was given.
    pub fn new(db_path: Option<PathBuf>, logging: LoggingConfig) -> Result<Self> {
        let db_path = match db_path {
            Some(path) => path,
            None => default_db_path()?,
        };
        Ok(Self { db_path, logging })
    }
}

/// Resolve the absolute path to the SQLite database inside the user's home.
pub fn default_db_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let config = Config::new(Some(PathBuf::from("/tmp/school.sqlite")), LoggingConfig::default())
            .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/school.sqlite"));
        assert_eq!(config.logging.level, "warn");
    }
}
