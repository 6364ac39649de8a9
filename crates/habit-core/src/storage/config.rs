//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Location of the habit store
//! - Rewards RNG seed
//! - Default log level
//!
//! Configuration is stored at `~/.config/habit/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{data_dir, data_dir_path, default_store_path, expand_home};
use crate::error::{ConfigError, HabitError, Result};

/// Store-specific configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store file; `~/.habit` when unset. A leading `~/` is expanded.
    #[serde(default)]
    pub path: Option<String>,
}

/// Rewards configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardsConfig {
    /// Fixed seed for the points RNG (None = random)
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/habit/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// `tracing` filter used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub rewards: RewardsConfig,
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            store: StoreConfig::default(),
            rewards: RewardsConfig::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> std::result::Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    _ if value == "null" => serde_json::Value::Null,
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(unknown());
                    }
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|e| invalid(format!("cannot parse '{value}' as number: {e}")))?
                            .into(),
                    ),
                    // Unset optional: numbers stay numbers, anything else is text.
                    serde_json::Value::Null => match value.parse::<u64>() {
                        Ok(n) => serde_json::Value::Number(n.into()),
                        Err(_) => serde_json::Value::String(value.into()),
                    },
                    serde_json::Value::String(_) => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default config file location.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the defaults first if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing the defaults there if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        match Self::read_from(path)? {
            Some(cfg) => Ok(cfg),
            None => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Load the config if one exists, else the defaults. Never touches the
    /// filesystem beyond reading, so habit commands leave `~/.config` alone.
    pub fn load_existing() -> Result<Self> {
        Self::load_existing_from(&data_dir_path().join("config.toml"))
    }

    /// Load from `path` if it exists, else the defaults.
    pub fn load_existing_from(path: &Path) -> Result<Self> {
        Ok(Self::read_from(path)?.unwrap_or_default())
    }

    fn read_from(path: &Path) -> Result<Option<Self>> {
        let load_failed = |message: String| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message,
        };
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)
                .map(Some)
                .map_err(|e| HabitError::from(load_failed(e.to_string()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(HabitError::from(load_failed(e.to_string()))),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. `null` clears an optional value.
    ///
    /// The change is validated against the typed config but not saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Store file this config points at.
    pub fn store_path(&self) -> Result<PathBuf> {
        match self.store.path.as_deref() {
            Some(path) if !path.trim().is_empty() => expand_home(path),
            _ => default_store_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let parsed: Config = toml::from_str("").unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let mut cfg = Config::default();
        cfg.rewards.seed = Some(42);
        assert_eq!(cfg.get("log_level").as_deref(), Some("warn"));
        assert_eq!(cfg.get("rewards.seed").as_deref(), Some("42"));
        assert_eq!(cfg.get("store.path").as_deref(), Some("null"));
        assert!(cfg.get("store").is_none());
        assert!(cfg.get("store.missing_key").is_none());
    }

    #[test]
    fn set_fills_and_clears_optional_values() {
        let mut cfg = Config::default();
        cfg.set("rewards.seed", "7").unwrap();
        cfg.set("store.path", "~/habits.tsv").unwrap();
        assert_eq!(cfg.rewards.seed, Some(7));
        assert_eq!(cfg.store.path.as_deref(), Some("~/habits.tsv"));

        cfg.set("rewards.seed", "null").unwrap();
        assert_eq!(cfg.rewards.seed, None);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        let err = cfg.set("store.nonexistent_key", "value").unwrap_err();
        assert!(matches!(err, HabitError::Config(ConfigError::UnknownKey(_))));
        assert!(cfg.set("", "value").is_err());
        assert!(cfg.set("store", "value").is_err());
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Config::default();
        let err = cfg.set("rewards.seed", "not_a_number").unwrap_err();
        assert!(matches!(err, HabitError::Config(ConfigError::InvalidValue { .. })));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn store_path_defaults_to_home_file() {
        let cfg = Config::default();
        if let Some(home) = dirs::home_dir() {
            assert_eq!(cfg.store_path().unwrap(), home.join(".habit"));
        }
    }

    #[test]
    fn store_path_uses_configured_path() {
        let mut cfg = Config::default();
        cfg.store.path = Some("/srv/habits/store".into());
        assert_eq!(cfg.store_path().unwrap(), PathBuf::from("/srv/habits/store"));
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let cfg = Config::load_from(&path).unwrap();

        assert_eq!(cfg, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn load_existing_from_missing_file_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let cfg = Config::load_existing_from(&path).unwrap();

        assert_eq!(cfg, Config::default());
        assert!(!path.exists());
    }

    #[test]
    fn load_existing_from_reads_saved_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "log_level = \"debug\"\n").unwrap();

        let cfg = Config::load_existing_from(&path).unwrap();
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn save_then_load_preserves_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.set("log_level", "debug").unwrap();
        cfg.set("rewards.seed", "99").unwrap();

        cfg.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn malformed_file_is_load_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "log_level = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, HabitError::Config(ConfigError::LoadFailed { .. })));
    }
}
