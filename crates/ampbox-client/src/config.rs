//! Client connection settings.

use std::time::Duration;

use crate::error::{ClientError, Result};

/// Environment variable holding the service URL.
pub const URL_ENV: &str = "AMPBOX_URL";
/// Environment variable holding the API key.
pub const KEY_ENV: &str = "AMPBOX_KEY";
/// Service URL used when nothing else is configured.
pub const DEFAULT_URL: &str = "http://localhost:8080";

/// Message shown when no API key can be found anywhere.
pub const MISSING_KEY_MESSAGE: &str = "Ampbox API key required. Set via:\n  export AMPBOX_KEY=<your-key>\n  or configure in settings";

/// Settings for [`crate::HttpSessionClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service base URL (e.g. "<https://ampbox.example.com>").
    pub base_url: String,
    /// API key sent as a bearer token.
    pub api_key: String,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Timeout for non-streaming requests.
    pub request_timeout: Duration,
    /// Honour `HTTP_PROXY`/`HTTPS_PROXY` from the environment.
    pub use_system_proxy: bool,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            use_system_proxy: true,
        }
    }

    /// Build from `AMPBOX_URL` and `AMPBOX_KEY`.
    pub fn from_env() -> Result<Self> {
        Self::resolve(
            std::env::var(URL_ENV).ok(),
            std::env::var(KEY_ENV).ok(),
        )
    }

    /// Build from optional URL and key, applying the default URL and
    /// rejecting a missing or blank key.
    pub fn resolve(base_url: Option<String>, api_key: Option<String>) -> Result<Self> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ClientError::Config(MISSING_KEY_MESSAGE.into()))?;
        let base_url = base_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_URL.to_string());
        Ok(Self::new(base_url, api_key))
    }
}
