//! Runtime configuration.
//!
//! Loaded from `~/.config/thumbfetch/config.toml` when present; every field
//! has a default so a missing or partial file is fine.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::size::SizeClass;

/// Tunables for the thumbnail service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of decoded images held in memory.
    pub cache_capacity: usize,
    /// Size tier used when a request token leaves the size unspecified.
    pub default_size: SizeClass,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            default_size: SizeClass::default(),
        }
    }
}

/// Get the config file path (~/.config/thumbfetch/config.toml)
pub fn config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("thumbfetch").join("config.toml"))
}

impl Config {
    /// Load configuration from the default location, or return defaults if
    /// no file exists.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Load configuration from a specific file, or return defaults if it
    /// does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to a specific file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cache_and_size_defaults() {
        let config = Config::default();
        assert_eq!(config.cache_capacity, DEFAULT_CACHE_CAPACITY);
        assert_eq!(config.default_size, SizeClass::Medium);
    }

    #[test]
    fn partial_toml_fills_missing_fields_with_defaults() {
        let config: Config = toml::from_str("cache_capacity = 50").unwrap();
        assert_eq!(config.cache_capacity, 50);
        assert_eq!(config.default_size, SizeClass::Medium);
    }

    #[test]
    fn load_from_missing_file_returns_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load_from(&tmp.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.toml");
        let config = Config {
            cache_capacity: 12,
            default_size: SizeClass::Large,
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "cache_capacity = \"lots\"").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
