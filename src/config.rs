//! Client configuration.

use serde::{Deserialize, Serialize};

/// Default per-request timeout (seconds).
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the backend RPC service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the backend RPC service.
    pub api_base_url: String,
    /// Per-request timeout for the HTTP client, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8787".to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load from environment variables. Returns `None` when the API URL is
    /// not configured.
    pub fn from_env() -> Option<Self> {
        let api_base_url = std::env::var("SHOPDESK_API_URL").ok()?;
        if api_base_url.is_empty() {
            return None;
        }

        let request_timeout_secs = std::env::var("SHOPDESK_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Some(Self {
            api_base_url,
            request_timeout_secs,
        })
    }

    /// Parse from a TOML document. Missing fields fall back to defaults.
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}
