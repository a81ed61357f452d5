use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{GeminiError, Result};
use crate::gemini::GeminiModel;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const MODEL_VAR: &str = "GEMINI_MODEL";
pub const BASE_URL_VAR: &str = "GEMINI_BASE_URL";
pub const TIMEOUT_VAR: &str = "GEMINI_TIMEOUT_SECS";

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Stand-in credential sent when `GEMINI_API_KEY` is unset. The service
/// rejects it, so a missing key surfaces as an authentication error.
pub const ABSENT_API_KEY: &str = "None";

/// Credential passed through to the service untouched.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn from_env_value(value: Option<String>) -> Self {
        match value {
            Some(key) => Self::new(key),
            None => {
                warn!(
                    "{} not set, sending \"{}\" as the API key",
                    API_KEY_VAR, ABSENT_API_KEY
                );
                Self::new(ABSENT_API_KEY)
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: ApiKey,
    pub model: GeminiModel,
    pub base_url: String,
    /// `None` leaves the transport default in place.
    pub timeout: Option<Duration>,
}

impl Config {
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            model: GeminiModel::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(ApiKey::from_env_value(lookup(API_KEY_VAR)));

        if let Some(model) = lookup(MODEL_VAR) {
            config.model = GeminiModel::parse(&model);
        }

        if let Some(base_url) = lookup(BASE_URL_VAR) {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }

        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                GeminiError::ConfigError(format!(
                    "{} must be a whole number of seconds, got {:?}",
                    TIMEOUT_VAR, raw
                ))
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }

        debug!("Model: {}", config.model.as_str());
        debug!("Base URL: {}", config.base_url);

        Ok(config)
    }
}
