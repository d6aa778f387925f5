//! Configuration loading and validation.
//!
//! All knobs the original tooling kept in module-level constants (application
//! id, endpoints, batch size, cache folders) travel here as explicit values
//! injected at construction time.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Wargaming API access configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Application id issued by the Wargaming developer portal. The shared
    /// "demo" id works but is heavily rate-limited and may truncate results.
    #[serde(default = "default_application_id")]
    pub application_id: String,

    /// API base URL (region cluster)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Maximum account ids per request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_application_id() -> String {
    "demo".to_string()
}

fn default_base_url() -> String {
    "https://api.worldoftanks.eu/wot/".to_string()
}

fn default_batch_size() -> usize {
    100
}

fn default_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            application_id: default_application_id(),
            base_url: default_base_url(),
            batch_size: default_batch_size(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Local data paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding registry CSV files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory holding the cached expected-values dataset
    #[serde(default = "default_res_dir")]
    pub res_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_res_dir() -> PathBuf {
    PathBuf::from("./res")
}

impl DataConfig {
    /// Path of the cached expected-values file.
    pub fn expected_values_path(&self) -> PathBuf {
        self.res_dir.join("wn8_exp_values.json")
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            res_dir: default_res_dir(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub data: DataConfig,
}

impl TrackerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: TrackerConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &PathBuf) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.application_id.is_empty() {
            return Err(ConfigError::ValidationError(
                "Application id must not be empty".to_string(),
            ));
        }

        if self.api.batch_size == 0 || self.api.batch_size > 100 {
            return Err(ConfigError::ValidationError(format!(
                "Batch size must be between 1 and 100, got {}",
                self.api.batch_size
            )));
        }

        if self.api.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if Url::parse(&self.api.base_url).is_err() {
            return Err(ConfigError::ValidationError(format!(
                "API base URL is not a valid URL: {}",
                self.api.base_url
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrackerConfig::default();

        assert_eq!(config.api.application_id, "demo");
        assert_eq!(config.api.batch_size, 100);
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.data.data_dir, PathBuf::from("./data"));
    }

    #[test]
    fn test_expected_values_path() {
        let config = TrackerConfig::default();
        assert_eq!(
            config.data.expected_values_path(),
            PathBuf::from("./res/wn8_exp_values.json")
        );
    }

    #[test]
    fn test_config_validation_ok() {
        let config = TrackerConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_empty_app_id() {
        let mut config = TrackerConfig::default();
        config.api.application_id = String::new();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_batch_size_bounds() {
        let mut config = TrackerConfig::default();
        config.api.batch_size = 0;
        assert!(config.validate().is_err());

        config.api.batch_size = 101;
        assert!(config.validate().is_err());

        config.api.batch_size = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_base_url() {
        let mut config = TrackerConfig::default();
        config.api.base_url = "not a url".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = TrackerConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        let parsed: TrackerConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.api.application_id, parsed.api.application_id);
        assert_eq!(config.data.res_dir, parsed.data.res_dir);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: TrackerConfig = toml::from_str(
            r#"
            [api]
            application_id = "abc123"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.api.application_id, "abc123");
        assert_eq!(parsed.api.batch_size, 100);
        assert_eq!(parsed.data.res_dir, PathBuf::from("./res"));
    }
}
