//! Environment-variable overlay for the config schema.

use crate::{ConfigError, MnemonConfig};
use log::debug;
use std::path::PathBuf;
use std::str::FromStr;

impl MnemonConfig {
    /// Load configuration from `MCP_*` environment variables over the
    /// defaults, then validate.
    ///
    /// Unset or unparseable variables fall back to their defaults; constraint
    /// violations fail here so a misconfigured process never starts.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = MnemonConfig::default();

        if let Some(dir) = env_var("MCP_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(dir);
        }
        set_parsed(&mut config.storage.max_file_size, "MCP_MAX_FILE_SIZE");
        set_parsed(&mut config.storage.max_storage_size, "MCP_MAX_STORAGE_SIZE");
        set_bool(&mut config.storage.enable_async, "MCP_ENABLE_ASYNC");
        set_parsed(&mut config.storage.queue_size, "MCP_QUEUE_SIZE");
        set_parsed(&mut config.storage.worker_threads, "MCP_WORKER_THREADS");
        set_bool(
            &mut config.storage.enable_compression,
            "MCP_ENABLE_COMPRESSION",
        );
        set_parsed(
            &mut config.storage.compression_level,
            "MCP_COMPRESSION_LEVEL",
        );
        set_bool(&mut config.storage.enable_encryption, "MCP_ENABLE_ENCRYPTION");
        if let Some(path) = env_var("MCP_ENCRYPTION_KEY_PATH") {
            config.storage.encryption_key_path = PathBuf::from(path);
        }

        if let Some(level) = env_var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = env_var("MCP_LOG_FORMAT") {
            config.logging.format = format;
        }
        set_parsed(&mut config.search.max_results, "MCP_MAX_RESULTS");

        config.validate()?;
        debug!(
            "config loaded from environment (data_dir={}, async={}, compression={}, encryption={})",
            config.storage.data_dir.display(),
            config.storage.enable_async,
            config.storage.enable_compression,
            config.storage.enable_encryption
        );
        Ok(config)
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Overwrite `target` when the variable is set and parses.
fn set_parsed<T: FromStr>(target: &mut T, key: &str) {
    if let Some(parsed) = env_var(key).and_then(|value| value.parse().ok()) {
        *target = parsed;
    }
}

/// Booleans accept "true"/"1" as true, anything else as false.
fn set_bool(target: &mut bool, key: &str) {
    if let Some(value) = env_var(key) {
        *target = value == "true" || value == "1";
    }
}

#[cfg(test)]
mod tests {
    use crate::MnemonConfig;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    // Serialize env mutation across tests in this module.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    fn with_env(vars: &[(&str, &str)], run: impl FnOnce()) {
        let _guard = ENV_LOCK.lock().unwrap();
        for (key, value) in vars {
            std::env::set_var(key, value);
        }
        run();
        for (key, _) in vars {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn overlays_environment_values() {
        with_env(
            &[
                ("MCP_DATA_DIR", "/tmp/mnemon-test"),
                ("MCP_QUEUE_SIZE", "42"),
                ("MCP_ENABLE_COMPRESSION", "false"),
            ],
            || {
                let config = MnemonConfig::from_env().expect("config");
                assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/mnemon-test"));
                assert_eq!(config.storage.queue_size, 42);
                assert!(!config.storage.enable_compression);
            },
        );
    }

    #[test]
    fn unparseable_values_keep_defaults() {
        with_env(&[("MCP_MAX_FILE_SIZE", "not-a-number")], || {
            let config = MnemonConfig::from_env().expect("config");
            assert_eq!(config.storage.max_file_size, 100 * 1024 * 1024);
        });
    }

    #[test]
    fn invalid_combinations_fail_at_load() {
        with_env(
            &[("MCP_ENABLE_ASYNC", "true"), ("MCP_QUEUE_SIZE", "0")],
            || {
                assert!(MnemonConfig::from_env().is_err());
            },
        );
    }
}
