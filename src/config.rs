//! Application configuration.

use crate::consts::dashboard_consts::{endpoints, fetching, text};
use crate::environment::Environment;
use crate::filter::RequiredLevel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{fs, io};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Could not determine the home directory")]
    NoHomeDir,
}

/// Which dashboard the session drives. Decides the required filter level.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DashboardVariant {
    #[default]
    EngineeringGrid,
    Dora,
}

impl DashboardVariant {
    pub fn required_level(&self) -> RequiredLevel {
        match self {
            DashboardVariant::EngineeringGrid => RequiredLevel::Vp,
            DashboardVariant::Dora => RequiredLevel::Director,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Endpoints {
    pub grid: String,
    pub monthly_trend: String,
    pub metric_export_prefix: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            grid: endpoints::GRID.to_string(),
            monthly_trend: endpoints::MONTHLY_TREND.to_string(),
            metric_export_prefix: endpoints::METRIC_EXPORT_PREFIX.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Overrides the environment's API root when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_root: Option<String>,
    pub variant: DashboardVariant,
    pub endpoints: Endpoints,
    pub export_dir: PathBuf,
    pub grid_export_filename: String,
    pub max_retries: u32,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_root: None,
            variant: DashboardVariant::default(),
            endpoints: Endpoints::default(),
            export_dir: PathBuf::from("."),
            grid_export_filename: text::DEFAULT_GRID_EXPORT_FILENAME.to_string(),
            max_retries: fetching::MAX_RETRIES,
            request_timeout_secs: fetching::REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Create Config for the given dashboard variant with default settings.
    pub fn new(variant: DashboardVariant) -> Self {
        Self {
            variant,
            ..Self::default()
        }
    }

    /// Loads configuration from a JSON file at the given path.
    ///
    /// Missing fields fall back to their defaults; the result is validated.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let buf = fs::read(path)?;
        let config: Config = serde_json::from_slice(&buf)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration to a JSON file at the given path.
    ///
    /// Directories will be created if they don't exist. This method overwrites existing files.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoints = [
            ("grid", &self.endpoints.grid),
            ("monthly_trend", &self.endpoints.monthly_trend),
            ("metric_export_prefix", &self.endpoints.metric_export_prefix),
        ];
        for (name, value) in endpoints {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("endpoint '{}' is empty", name)));
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        if self.grid_export_filename.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "grid_export_filename is empty".to_string(),
            ));
        }
        if let Some(root) = &self.api_root {
            if !root.starts_with("http://") && !root.starts_with("https://") {
                return Err(ConfigError::Invalid(format!(
                    "api_root '{}' is not an http(s) URL",
                    root
                )));
            }
        }
        Ok(())
    }

    /// The configured API root, or the environment's default.
    pub fn api_root(&self, environment: Environment) -> String {
        self.api_root
            .clone()
            .unwrap_or_else(|| environment.api_root())
    }

    pub fn required_level(&self) -> RequiredLevel {
        self.variant.required_level()
    }
}

/// Default location of the config file: `~/.metrics-dashboard/config.json`.
pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    let home_path = home::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home_path.join(".metrics-dashboard").join("config.json"))
}

/// Loads `path` when it exists, otherwise returns the default configuration.
pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        Config::load_from_file(path)
    } else {
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    // Loading a saved configuration file should return the same configuration.
    fn test_load_recovers_saved_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::new(DashboardVariant::Dora);
        config.api_root = Some("http://localhost:9000/api".to_string());
        config.save(&path).unwrap();

        let loaded_config = Config::load_from_file(&path).unwrap();
        assert_eq!(config, loaded_config);
    }

    #[test]
    // Saving a configuration should create directories if they don't exist.
    fn test_save_creates_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nonexistent_dir").join("config.json");

        let config = Config::default();
        let result = config.save(&path);

        assert!(result.is_ok(), "Failed to save config");
        assert!(
            path.parent().unwrap().exists(),
            "Parent directory does not exist"
        );
    }

    #[test]
    // Saving a configuration should overwrite an existing file.
    fn test_save_overwrites_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        Config::new(DashboardVariant::EngineeringGrid)
            .save(&path)
            .unwrap();
        let config2 = Config::new(DashboardVariant::Dora);
        config2.save(&path).unwrap();

        let loaded_config = Config::load_from_file(&path).unwrap();
        assert_eq!(config2, loaded_config);
    }

    #[test]
    // Loading an invalid JSON file should return an error.
    fn test_load_rejects_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid_config.json");

        let mut file = File::create(&path).unwrap();
        writeln!(file, "invalid json").unwrap();

        let result = Config::load_from_file(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    // Partial files fill the gaps with defaults.
    fn test_load_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"variant": "dora", "max_retries": 5}"#).unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.variant, DashboardVariant::Dora);
        assert_eq!(config.required_level(), RequiredLevel::Director);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.endpoints, Endpoints::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.endpoints.grid = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api_root = Some("metrics.internal".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_root_prefers_override() {
        let mut config = Config::default();
        assert_eq!(
            config.api_root(Environment::Local),
            "http://localhost:8085/api"
        );
        config.api_root = Some("https://example.test/api".to_string());
        assert_eq!(
            config.api_root(Environment::Local),
            "https://example.test/api"
        );
    }

    #[test]
    fn test_missing_file_yields_default() {
        let dir = tempdir().unwrap();
        let config = load_or_default(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }
}
