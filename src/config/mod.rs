//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::fetch::ApiClientConfig;
use crate::normalize::normalize_tag;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("API token not set: export {0}")]
    MissingToken(String),
}

/// War API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL including the version segment
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable holding the bearer token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "https://api.clashofclans.com/v1".to_string()
}

fn default_token_env() -> String {
    "COC_API_TOKEN".to_string()
}

fn default_timeout() -> u64 {
    25
}

fn default_user_agent() -> String {
    concat!("cwl-tracker/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_env: default_token_env(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl ApiConfig {
    /// Client settings, reading the token from the configured variable.
    pub fn client_config(&self) -> Result<ApiClientConfig, ConfigError> {
        let token = std::env::var(&self.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingToken(self.token_env.clone()))?;

        Ok(ApiClientConfig {
            base_url: self.base_url.clone(),
            token: token.trim().to_string(),
            timeout: Duration::from_secs(self.timeout_seconds),
            user_agent: self.user_agent.clone(),
        })
    }
}

/// The tracked team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamConfig {
    /// Team tag, e.g. `#2QQYJC08Y`
    #[serde(default)]
    pub tag: String,

    /// Competition name used in season titles
    #[serde(default = "default_competition_name")]
    pub competition_name: String,
}

fn default_competition_name() -> String {
    "CWL".to_string()
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            tag: String::new(),
            competition_name: default_competition_name(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub team: TeamConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            api: ApiConfig::default(),
            team: TeamConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Canonical tracked team tag.
    pub fn team_tag(&self) -> String {
        normalize_tag(Some(&self.team.tag))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "API timeout must be greater than 0".to_string(),
            ));
        }

        let tag = self.team_tag();
        if tag.len() < 2 || !tag.starts_with('#') {
            return Err(ConfigError::ValidationError(format!(
                "Team tag must look like #ABC123, got {:?}",
                self.team.tag
            )));
        }

        if self.team.competition_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Competition name must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
