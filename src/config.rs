//! Configuration management for DocChat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{DocchatError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for DocChat
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Backend API settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Chat behaviour settings
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    ///
    /// The backend mounts its routers under `/api`, so the default includes
    /// that prefix.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout() -> u64 {
    120
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Chat mode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Vector store collection to query; the backend default is used when unset
    #[serde(default)]
    pub collection: Option<String>,

    /// Print citations under each answer
    #[serde(default = "default_show_citations")]
    pub show_citations: bool,

    /// Maximum characters of a citation snippet shown inline
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
}

fn default_show_citations() -> bool {
    true
}

fn default_snippet_chars() -> usize {
    160
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            collection: None,
            show_citations: default_show_citations(),
            snippet_chars: default_snippet_chars(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DocchatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| DocchatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("DOCCHAT_API_BASE_URL") {
            self.api.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("DOCCHAT_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.api.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid DOCCHAT_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(collection) = std::env::var("DOCCHAT_COLLECTION") {
            self.chat.collection = if collection.is_empty() {
                None
            } else {
                Some(collection)
            };
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(base_url) = &cli.base_url {
            tracing::debug!("Using base URL override from CLI: {}", base_url);
            self.api.base_url = base_url.clone();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if the base URL does not parse as an http(s) URL or the
    /// timeout is zero
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.api.base_url).map_err(|e| {
            DocchatError::Config(format!(
                "Invalid api.base_url '{}': {}",
                self.api.base_url, e
            ))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(DocchatError::Config(format!(
                "api.base_url must use http or https, got: {}",
                url.scheme()
            ))
            .into());
        }

        if self.api.timeout_seconds == 0 {
            return Err(DocchatError::Config(
                "api.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.chat.snippet_chars == 0 {
            return Err(DocchatError::Config(
                "chat.snippet_chars must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8000/api");
        assert_eq!(config.api.timeout_seconds, 120);
        assert!(config.chat.collection.is_none());
        assert!(config.chat.show_citations);
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_url() {
        let mut config = Config::default();
        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.api.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = Config::default();
        config.api.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
api:
  base_url: https://docs.example.com/api
  timeout_seconds: 30
chat:
  collection: handbook
  show_citations: false
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.api.base_url, "https://docs.example.com/api");
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.chat.collection.as_deref(), Some("handbook"));
        assert!(!config.chat.show_citations);
        assert_eq!(config.chat.snippet_chars, 160);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("chat:\n  collection: x\n").unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8000/api");
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_defaults() {
        std::env::remove_var("DOCCHAT_API_BASE_URL");
        std::env::remove_var("DOCCHAT_TIMEOUT_SECONDS");
        std::env::remove_var("DOCCHAT_COLLECTION");

        let cli = Cli::default();
        let config = Config::load("/nonexistent/docchat.yaml", &cli).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8000/api");
    }

    #[test]
    #[serial]
    fn test_env_vars_override_file_values() {
        std::env::set_var("DOCCHAT_API_BASE_URL", "http://10.0.0.5:9000/api");
        std::env::set_var("DOCCHAT_TIMEOUT_SECONDS", "7");
        std::env::set_var("DOCCHAT_COLLECTION", "legal");

        let cli = Cli::default();
        let config = Config::load("/nonexistent/docchat.yaml", &cli).unwrap();

        std::env::remove_var("DOCCHAT_API_BASE_URL");
        std::env::remove_var("DOCCHAT_TIMEOUT_SECONDS");
        std::env::remove_var("DOCCHAT_COLLECTION");

        assert_eq!(config.api.base_url, "http://10.0.0.5:9000/api");
        assert_eq!(config.api.timeout_seconds, 7);
        assert_eq!(config.chat.collection.as_deref(), Some("legal"));
    }

    #[test]
    #[serial]
    fn test_invalid_timeout_env_is_ignored() {
        std::env::set_var("DOCCHAT_TIMEOUT_SECONDS", "soon");
        let config = Config::load("/nonexistent/docchat.yaml", &Cli::default()).unwrap();
        std::env::remove_var("DOCCHAT_TIMEOUT_SECONDS");
        assert_eq!(config.api.timeout_seconds, 120);
    }

    #[test]
    #[serial]
    fn test_cli_base_url_wins_over_env() {
        std::env::set_var("DOCCHAT_API_BASE_URL", "http://env.example/api");
        let mut cli = Cli::default();
        cli.base_url = Some("http://cli.example/api".to_string());
        let config = Config::load("/nonexistent/docchat.yaml", &cli).unwrap();
        std::env::remove_var("DOCCHAT_API_BASE_URL");
        assert_eq!(config.api.base_url, "http://cli.example/api");
    }
}
