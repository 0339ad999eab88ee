//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.medaware.toml` files.

use crate::api::ApiConfig;
use crate::cli::{Args, OutputFormat};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE: &str = ".medaware.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend settings.
    #[serde(default)]
    pub api: ApiSettings,

    /// Credentials.
    #[serde(default)]
    pub auth: AuthSettings,

    /// Insights report settings.
    #[serde(default)]
    pub insights: InsightsSettings,
}

/// Health backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL of the health API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Signed-in user. Normally supplied through the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Insights report settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsSettings {
    /// Report format: "markdown" or "json".
    #[serde(default)]
    pub format: OutputFormat,

    /// Where to write the report. Printed to stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl Default for InsightsSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::Markdown,
            output: None,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.medaware.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments (and the env vars clap reads for them) take precedence
    /// over config file settings. Only explicitly provided values override.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref url) = args.api_url {
            self.api.base_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.api.timeout_seconds = timeout;
        }
        if let Some(ref user) = args.user {
            self.auth.user_id = Some(user.clone());
        }
        if let Some(ref token) = args.token {
            self.auth.token = Some(token.clone());
        }
    }

    /// Client settings derived from the `[api]` section.
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.api.base_url.clone(),
            timeout_seconds: self.api.timeout_seconds,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
