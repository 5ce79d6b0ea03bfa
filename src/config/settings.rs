//! Configuration settings and validation.

use std::path::PathBuf;
use std::time::Duration;

use crate::index::{IndexerConfig, DEFAULT_IGNORE_FILE, DEFAULT_MAX_FILE_SIZE};
use crate::watcher::{WatcherConfig, DEFAULT_DEBOUNCE};
use crate::{Error, Result};

/// Longest accepted debounce.
const MAX_DEBOUNCE: Duration = Duration::from_secs(600);

/// Main configuration for codeindex.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory for persisted indexes.
    pub data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON.
    pub log_json: bool,

    /// Quiet period before an automatic re-index.
    pub debounce: Duration,

    /// Files larger than this many bytes are not indexed.
    pub max_file_size: u64,

    /// Ignore file name, looked up at each root.
    pub ignore_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./.codeindex"),
            log_level: "info".to_string(),
            log_json: false,
            debounce: DEFAULT_DEBOUNCE,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            ignore_file: DEFAULT_IGNORE_FILE.to_string(),
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.debounce.is_zero() {
            return Err(Error::config("debounce cannot be 0"));
        }

        if self.debounce > MAX_DEBOUNCE {
            return Err(Error::config(format!(
                "debounce cannot exceed {} seconds",
                MAX_DEBOUNCE.as_secs()
            )));
        }

        if self.max_file_size == 0 {
            return Err(Error::config("max_file_size cannot be 0"));
        }

        if self.ignore_file.is_empty() {
            return Err(Error::config("ignore_file cannot be empty"));
        }

        if self.ignore_file.contains(['/', '\\']) || self.ignore_file == ".." {
            return Err(Error::config(format!(
                "ignore_file must be a file name, got '{}'",
                self.ignore_file
            )));
        }

        if self.data_dir.as_os_str().is_empty() {
            return Err(Error::config("data_dir cannot be empty"));
        }

        Ok(())
    }

    /// Indexer settings. The data directory is excluded from the walk.
    #[must_use]
    pub fn indexer_config(&self) -> IndexerConfig {
        IndexerConfig {
            max_file_size: self.max_file_size,
            ignore_file: self.ignore_file.clone(),
            exclude_paths: vec![self.data_dir.clone()],
        }
    }

    /// Watcher settings.
    #[must_use]
    pub const fn watcher_config(&self) -> WatcherConfig {
        WatcherConfig {
            debounce: self.debounce,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data_dir, PathBuf::from("./.codeindex"));
        assert_eq!(config.debounce, Duration::from_millis(5000));
        assert_eq!(config.max_file_size, 500 * 1024);
        assert_eq!(config.ignore_file, ".gitignore");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_new() {
        let config = Config::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let config = Config {
            log_level: "invalid".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log level"));
    }

    #[test]
    fn test_log_level_case_insensitive() {
        for level in ["TRACE", "Debug", "INFO", "Warn", "ERROR"] {
            let config = Config {
                log_level: level.to_string(),
                ..Default::default()
            };
            assert!(
                config.validate().is_ok(),
                "Level '{level}' should be valid (case insensitive)"
            );
        }
    }

    #[test]
    fn test_validate_debounce_bounds() {
        let zero = Config {
            debounce: Duration::ZERO,
            ..Default::default()
        };
        assert!(zero.validate().unwrap_err().to_string().contains("debounce"));

        let long = Config {
            debounce: Duration::from_secs(601),
            ..Default::default()
        };
        assert!(long.validate().unwrap_err().to_string().contains("600"));

        let edge = Config {
            debounce: MAX_DEBOUNCE,
            ..Default::default()
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn test_validate_max_file_size_zero() {
        let config = Config {
            max_file_size: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_file_size"));
    }

    #[test]
    fn test_validate_ignore_file_must_be_a_name() {
        for bad in ["", "sub/.gitignore", "..\\.gitignore", ".."] {
            let config = Config {
                ignore_file: bad.to_string(),
                ..Default::default()
            };
            assert!(config.validate().is_err(), "'{bad}' should be rejected");
        }

        let config = Config {
            ignore_file: ".codeignore".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_component_configs() {
        let config = Config {
            debounce: Duration::from_millis(250),
            max_file_size: 1024,
            ignore_file: ".codeignore".to_string(),
            ..Default::default()
        };

        let indexer = config.indexer_config();
        assert_eq!(indexer.max_file_size, 1024);
        assert_eq!(indexer.ignore_file, ".codeignore");
        assert_eq!(indexer.exclude_paths, vec![config.data_dir.clone()]);
        assert_eq!(config.watcher_config().debounce, Duration::from_millis(250));
    }
}
