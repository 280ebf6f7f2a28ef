//! Configuration schema for Mnemon.

use crate::ConfigError;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root config for the Mnemon engine and its adapters.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MnemonConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

impl MnemonConfig {
    /// Validate every section, failing on the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.storage.validate()?;
        self.search.validate()
    }
}

/// Data storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for record files, indices, and logs.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Upper bound on a single on-disk record file, in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Upper bound on total on-disk storage, in bytes.
    #[serde(default = "default_max_storage_size")]
    pub max_storage_size: u64,
    /// Persist records through the write-behind queue.
    #[serde(default = "default_enable_async")]
    pub enable_async: bool,
    /// Capacity of the write-behind queue.
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,
    /// Number of save worker threads.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    /// Gzip record files before writing.
    #[serde(default = "default_enable_compression")]
    pub enable_compression: bool,
    /// Gzip level, 1 (fastest) through 9 (densest).
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,
    /// Seal record files with AES-256-GCM.
    #[serde(default)]
    pub enable_encryption: bool,
    /// Location of the 32-byte at-rest key file.
    #[serde(default = "default_encryption_key_path")]
    pub encryption_key_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            max_file_size: default_max_file_size(),
            max_storage_size: default_max_storage_size(),
            enable_async: default_enable_async(),
            queue_size: default_queue_size(),
            worker_threads: default_worker_threads(),
            enable_compression: default_enable_compression(),
            compression_level: default_compression_level(),
            enable_encryption: false,
            encryption_key_path: default_encryption_key_path(),
        }
    }
}

impl StorageConfig {
    /// Validate storage limits and feature-gated settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enable_compression && !(1..=9).contains(&self.compression_level) {
            return Err(ConfigError::invalid(
                "storage.compression_level",
                format!("must be between 1 and 9, got {}", self.compression_level),
            ));
        }
        if self.enable_encryption && self.encryption_key_path.as_os_str().is_empty() {
            return Err(ConfigError::invalid(
                "storage.encryption_key_path",
                "must be set when encryption is enabled",
            ));
        }
        if self.enable_async && self.queue_size < 1 {
            return Err(ConfigError::invalid(
                "storage.queue_size",
                "must be at least 1 when async is enabled",
            ));
        }
        if self.enable_async && self.worker_threads < 1 {
            return Err(ConfigError::invalid(
                "storage.worker_threads",
                "must be at least 1 when async is enabled",
            ));
        }
        if self.max_file_size == 0 {
            return Err(ConfigError::invalid(
                "storage.max_file_size",
                "must be positive",
            ));
        }
        if self.max_storage_size == 0 {
            return Err(ConfigError::invalid(
                "storage.max_storage_size",
                "must be positive",
            ));
        }
        if self.max_file_size > self.max_storage_size {
            return Err(ConfigError::invalid(
                "storage.max_file_size",
                format!(
                    "{} cannot exceed max_storage_size {}",
                    self.max_file_size, self.max_storage_size
                ),
            ));
        }
        Ok(())
    }
}

/// Logging configuration consumed by binaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter: "debug", "info", "warn", or "error".
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format: "json" or "text".
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Search and listing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Default result cap applied by adapters.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
        }
    }
}

impl SearchConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_results == 0 {
            return Err(ConfigError::invalid(
                "search.max_results",
                "must be positive",
            ));
        }
        Ok(())
    }
}

/// Default data directory under the user's home.
fn default_data_dir() -> PathBuf {
    home_dir().join(".mcp-memory")
}

/// Default single-file ceiling: 100 MiB.
fn default_max_file_size() -> u64 {
    100 * 1024 * 1024
}

/// Default storage ceiling: 100 GiB.
fn default_max_storage_size() -> u64 {
    100 * 1024 * 1024 * 1024
}

fn default_enable_async() -> bool {
    true
}

fn default_queue_size() -> usize {
    1000
}

fn default_worker_threads() -> usize {
    2
}

fn default_enable_compression() -> bool {
    true
}

/// Default gzip level; 6 balances density and speed.
fn default_compression_level() -> u32 {
    6
}

fn default_encryption_key_path() -> PathBuf {
    home_dir().join(".mcp-memory").join("encryption.key")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_max_results() -> usize {
    20
}

fn home_dir() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::{MnemonConfig, StorageConfig};

    #[test]
    fn default_config_is_valid() {
        MnemonConfig::default().validate().expect("valid defaults");
    }

    #[test]
    fn rejects_out_of_range_compression_level() {
        let mut config = MnemonConfig::default();
        config.storage.compression_level = 0;
        assert!(config.validate().is_err());
        config.storage.compression_level = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_key_path_when_encryption_enabled() {
        let mut config = MnemonConfig::default();
        config.storage.enable_encryption = true;
        config.storage.encryption_key_path = Default::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_queue_and_workers_in_async_mode() {
        let mut config = MnemonConfig::default();
        config.storage.queue_size = 0;
        assert!(config.validate().is_err());

        let mut config = MnemonConfig::default();
        config.storage.worker_threads = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_file_limit_above_storage_limit() {
        let storage = StorageConfig {
            max_file_size: 2048,
            max_storage_size: 1024,
            ..StorageConfig::default()
        };
        assert!(storage.validate().is_err());
    }
}
