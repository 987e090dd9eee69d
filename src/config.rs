//! Client configuration from the environment

use reqwest::Url;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const BASE_URL_VAR: &str = "CHAT_API_BASE_URL";
const TIMEOUT_VAR: &str = "CHAT_API_TIMEOUT_SECS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("CHAT_API_BASE_URL={value:?} is not a usable service URL: {reason}")]
    InvalidBaseUrl { value: String, reason: String },
    #[error("CHAT_API_TIMEOUT_SECS={0:?} must be a positive number of seconds")]
    InvalidTimeout(String),
}

/// Where the chat service lives and how long to wait for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Read `CHAT_API_BASE_URL` and `CHAT_API_TIMEOUT_SECS`, falling back to
    /// the defaults for unset variables.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when a variable is set but unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable variable source.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when a variable is set but unusable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(BASE_URL_VAR) {
            validate_base_url(&value)?;
            config.base_url = value.trim_end_matches('/').to_string();
        }

        if let Some(value) = lookup(TIMEOUT_VAR) {
            config.timeout = value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidTimeout(value))?;
        }

        Ok(config)
    }
}

fn validate_base_url(value: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        value: value.to_string(),
        reason,
    };
    let url = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme {other:?}"))),
    }
}
