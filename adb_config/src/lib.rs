//! ABOUTME: Configuration management with validation and environment loading
//! ABOUTME: Handles database, blob storage and logging settings from env and files

use adb_core::{Error, Result};
use config::{Config as ConfigBuilder, Environment};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Main configuration struct
#[derive(Debug, Clone, Deserialize, Serialize, Validate, Default)]
#[serde(default)]
pub struct Config {
    #[validate(nested)]
    pub database: DatabaseConfig,
    #[validate(nested)]
    pub storage: StorageConfig,
    #[validate(nested)]
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct DatabaseConfig {
    #[validate(length(min = 1))]
    pub path: String,
    #[validate(range(min = 1, max = 100))]
    pub pool_size: u32,
    pub sqlite_wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "antidb.db".to_string(),
            pool_size: 10,
            sqlite_wal: true,
        }
    }
}

/// Blob storage for structure and PDB files
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct StorageConfig {
    /// Root directory under which `structure_files/` and `pdb_files/` live
    #[validate(length(min = 1))]
    pub media_root: String,
    /// Give up retrying a failed blob operation after this many seconds
    #[validate(range(min = 1, max = 600))]
    pub retry_max_elapsed_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            media_root: "./data/media".to_string(),
            retry_max_elapsed_secs: 30,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct LoggingConfig {
    /// `production` switches the subscriber to JSON output
    #[validate(length(min = 1))]
    pub environment: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables and an optional `.env`
    /// file in the working directory or one of its parents
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Like [`load`](Self::load) with an explicit env file, which must exist.
    /// Variables already set in the process win over the file.
    pub fn load_with_env_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        dotenvy::from_path(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_env()
    }

    fn from_env() -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        builder = builder
            .set_default("database.path", "antidb.db")?
            .set_default("database.pool_size", 10)?
            .set_default("database.sqlite_wal", true)?
            .set_default("storage.media_root", "./data/media")?
            .set_default("storage.retry_max_elapsed_secs", 30)?
            .set_default("logging.environment", "development")?;

        // Keys containing underscores don't survive the "_" separator below
        if let Ok(pool_size) = std::env::var("ANTIDB_DATABASE_POOL_SIZE") {
            builder = builder.set_override("database.pool_size", pool_size)?;
        }
        if let Ok(wal) = std::env::var("ANTIDB_DATABASE_SQLITE_WAL") {
            builder = builder.set_override("database.sqlite_wal", wal)?;
        }
        if let Ok(media_root) = std::env::var("ANTIDB_STORAGE_MEDIA_ROOT") {
            builder = builder.set_override("storage.media_root", media_root)?;
        }
        if let Ok(secs) = std::env::var("ANTIDB_STORAGE_RETRY_MAX_ELAPSED_SECS") {
            builder = builder.set_override("storage.retry_max_elapsed_secs", secs)?;
        }

        // ANTIDB_ prefixed variables take the highest priority
        builder = builder.add_source(
            Environment::with_prefix("ANTIDB")
                .try_parsing(true)
                .separator("_"),
        );

        let config = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build config: {}", e)))?;

        let parsed: Config = config
            .try_deserialize()
            .map_err(|e| Error::Config(format!("Failed to deserialize config: {}", e)))?;

        parsed
            .validate()
            .map_err(|e| Error::Config(format!("Config validation failed: {}", e)))?;

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Tests below mutate process-wide environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 6] = [
        "ANTIDB_DATABASE_PATH",
        "ANTIDB_DATABASE_POOL_SIZE",
        "ANTIDB_DATABASE_SQLITE_WAL",
        "ANTIDB_STORAGE_MEDIA_ROOT",
        "ANTIDB_STORAGE_RETRY_MAX_ELAPSED_SECS",
        "ANTIDB_LOGGING_ENVIRONMENT",
    ];

    fn clear_vars() {
        for key in VARS {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_config_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_vars();

        let config = Config::load().expect("Should load with defaults");

        assert_eq!(config.database.path, "antidb.db");
        assert_eq!(config.database.pool_size, 10);
        assert!(config.database.sqlite_wal);
        assert_eq!(config.storage.media_root, "./data/media");
        assert_eq!(config.storage.retry_max_elapsed_secs, 30);
        assert_eq!(config.logging.environment, "development");
    }

    #[test]
    fn test_config_from_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_vars();

        env::set_var("ANTIDB_DATABASE_PATH", "/tmp/antibodies.db");
        env::set_var("ANTIDB_DATABASE_POOL_SIZE", "4");
        env::set_var("ANTIDB_STORAGE_MEDIA_ROOT", "/srv/media");

        let config = Config::load().expect("Should load from env");

        assert_eq!(config.database.path, "/tmp/antibodies.db");
        assert_eq!(config.database.pool_size, 4);
        assert_eq!(config.storage.media_root, "/srv/media");

        clear_vars();
    }

    #[test]
    fn test_config_validation_failure() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_vars();

        env::set_var("ANTIDB_DATABASE_POOL_SIZE", "200");
        let result = Config::load();
        assert!(matches!(result, Err(Error::Config(_))));

        clear_vars();
    }

    #[test]
    fn test_retry_window_out_of_range() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_vars();

        env::set_var("ANTIDB_STORAGE_RETRY_MAX_ELAPSED_SECS", "0");
        assert!(Config::load().is_err());

        clear_vars();
    }

    #[test]
    fn test_config_from_env_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_vars();

        let dir = tempfile::tempdir().unwrap();
        let env_file = dir.path().join(".env");
        std::fs::write(
            &env_file,
            "ANTIDB_DATABASE_PATH=/tmp/from_dotenv.db\nANTIDB_DATABASE_POOL_SIZE=3\n",
        )
        .unwrap();

        let config = Config::load_with_env_file(&env_file).expect("Should load from .env");
        assert_eq!(config.database.path, "/tmp/from_dotenv.db");
        assert_eq!(config.database.pool_size, 3);

        clear_vars();
    }

    #[test]
    fn test_process_env_wins_over_env_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_vars();

        let dir = tempfile::tempdir().unwrap();
        let env_file = dir.path().join(".env");
        std::fs::write(&env_file, "ANTIDB_DATABASE_PATH=/tmp/from_dotenv.db\n").unwrap();
        env::set_var("ANTIDB_DATABASE_PATH", "/tmp/from_process.db");

        let config = Config::load_with_env_file(&env_file).unwrap();
        assert_eq!(config.database.path, "/tmp/from_process.db");

        clear_vars();
    }

    #[test]
    fn test_missing_env_file_is_an_error() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();

        let result = Config::load_with_env_file(dir.path().join("absent.env"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_default_struct_validates() {
        assert!(Config::default().validate().is_ok());
    }
}
