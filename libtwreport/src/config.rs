//! Configuration management for twreport
//!
//! The config file is optional. Anything it holds can also be given on the
//! command line or through the environment; the command-line layer decides
//! precedence and hands the merged values to [`Credentials::from_parts`] and
//! [`crate::types::BatchJob`].
//!
//! ```toml
//! [twitter]
//! consumer_key = "..."
//! consumer_secret = "..."
//! access_token = "..."
//! access_token_secret = "..."
//!
//! [report]
//! column = 0
//! block = false
//! backoff_secs = 900
//! output_dir = "~/twreport"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Base URL of the Twitter REST API
pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";

/// The report-spam quota window
pub const DEFAULT_BACKOFF_SECS: u64 = 15 * 60;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub twitter: TwitterConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterConfig {
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub access_token: Option<String>,
    pub access_token_secret: Option<String>,
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Zero-based column holding the screen name
    pub column: usize,
    pub block: bool,
    pub backoff_secs: u64,
    pub output_dir: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            column: 0,
            block: false,
            backoff_secs: DEFAULT_BACKOFF_SECS,
            output_dir: ".".to_string(),
        }
    }
}

impl ReportConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }

    /// Output directory with `~` and environment variables expanded
    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.output_dir).to_string())
    }
}

impl TwitterConfig {
    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }
}

impl Config {
    /// Load configuration from the resolved location.
    ///
    /// A missing file is only an error when `TWREPORT_CONFIG` names it
    /// explicitly; otherwise the built-in defaults are used.
    pub fn load() -> Result<Self> {
        if let Some(path) = explicit_config_path() {
            return Self::load_from_path(&path);
        }

        let path = resolve_config_path()?;
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }
}

fn explicit_config_path() -> Option<PathBuf> {
    std::env::var("TWREPORT_CONFIG")
        .ok()
        .filter(|p| !p.is_empty())
        .map(|p| PathBuf::from(shellexpand::tilde(&p).to_string()))
}

/// Resolve the configuration file path (XDG config directory unless `TWREPORT_CONFIG` is set)
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Some(path) = explicit_config_path() {
        return Ok(path);
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("twreport").join("config.toml"))
}

/// The four OAuth 1.0a strings identifying the app and the acting account
pub struct Credentials {
    consumer_key: SecretString,
    consumer_secret: SecretString,
    access_token: SecretString,
    access_token_secret: SecretString,
}

impl Credentials {
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: SecretString::from(consumer_key.into()),
            consumer_secret: SecretString::from(consumer_secret.into()),
            access_token: SecretString::from(access_token.into()),
            access_token_secret: SecretString::from(access_token_secret.into()),
        }
    }

    /// Build credentials from optional parts, failing on the first one that
    /// is missing or blank.
    pub fn from_parts(
        consumer_key: Option<String>,
        consumer_secret: Option<String>,
        access_token: Option<String>,
        access_token_secret: Option<String>,
    ) -> Result<Self> {
        Ok(Self::new(
            require(consumer_key, "twitter.consumer_key")?,
            require(consumer_secret, "twitter.consumer_secret")?,
            require(access_token, "twitter.access_token")?,
            require(access_token_secret, "twitter.access_token_secret")?,
        ))
    }

    pub(crate) fn consumer_key(&self) -> &str {
        self.consumer_key.expose_secret()
    }

    pub(crate) fn consumer_secret(&self) -> &str {
        self.consumer_secret.expose_secret()
    }

    pub(crate) fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    pub(crate) fn access_token_secret(&self) -> &str {
        self.access_token_secret.expose_secret()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").finish_non_exhaustive()
    }
}

fn require(value: Option<String>, field: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::MissingField(field.to_string()).into()),
    }
}
