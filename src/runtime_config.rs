// =============================================================================
// Runtime Configuration: service settings and provider credentials
// =============================================================================
//
// Tunables come from an optional JSON file. All fields carry
// `#[serde(default)]` so a partial (or empty) file is always valid. A few
// deployment settings can be overridden from the environment.
//
// Credentials are kept apart in `Credentials`; they are read from the
// environment only and are never serialised or logged.
// =============================================================================

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Field defaults
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_interval() -> String {
    "5min".to_string()
}

fn default_max_bars() -> usize {
    300
}

fn default_series_timeout_secs() -> u64 {
    30
}

fn default_quote_timeout_secs() -> u64 {
    15
}

fn default_primary_base_url() -> String {
    "https://www.alphavantage.co/query".to_string()
}

fn default_secondary_base_url() -> String {
    "https://yfapi.net/v6/finance/quote".to_string()
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Bar interval used when a request does not name one.
    #[serde(default = "default_interval")]
    pub default_interval: String,

    /// Only the most recent `max_bars` bars are kept from a series response.
    #[serde(default = "default_max_bars")]
    pub max_bars: usize,

    /// Timeout for the intraday series request.
    #[serde(default = "default_series_timeout_secs")]
    pub series_timeout_secs: u64,

    /// Timeout for each quote request.
    #[serde(default = "default_quote_timeout_secs")]
    pub quote_timeout_secs: u64,

    #[serde(default = "default_primary_base_url")]
    pub primary_base_url: String,

    #[serde(default = "default_secondary_base_url")]
    pub secondary_base_url: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            default_interval: default_interval(),
            max_bars: default_max_bars(),
            series_timeout_secs: default_series_timeout_secs(),
            quote_timeout_secs: default_quote_timeout_secs(),
            primary_base_url: default_primary_base_url(),
            secondary_base_url: default_secondary_base_url(),
        }
    }
}

impl RuntimeConfig {
    /// Read a JSON config file. Missing fields take their defaults; a missing
    /// or malformed file is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;

        info!(
            path = %path.display(),
            bind_addr = %config.bind_addr,
            max_bars = config.max_bars,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Apply environment overrides.
    ///
    /// `PORT` binds every interface on that port; `INDICATORS_BIND_ADDR`
    /// takes precedence over it.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup("PORT").filter(|p| !p.trim().is_empty()) {
            self.bind_addr = format!("0.0.0.0:{}", port.trim());
        }
        if let Some(addr) = lookup("INDICATORS_BIND_ADDR").filter(|a| !a.trim().is_empty()) {
            self.bind_addr = addr.trim().to_string();
        }
    }

    pub fn series_timeout(&self) -> Duration {
        Duration::from_secs(self.series_timeout_secs)
    }

    pub fn quote_timeout(&self) -> Duration {
        Duration::from_secs(self.quote_timeout_secs)
    }
}

// =============================================================================
// Credentials
// =============================================================================

/// Provider API keys. Blank values count as absent.
#[derive(Clone, Default)]
pub struct Credentials {
    /// Required for the primary (Alpha Vantage) source.
    pub primary_api_key: Option<String>,
    /// Optional; the secondary (Yahoo via RapidAPI) source is disabled without it.
    pub secondary_api_key: Option<String>,
}

impl Credentials {
    /// Read `ALPHA_VANTAGE_KEY` and `YF_API_KEY` from the environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            primary_api_key: non_blank("ALPHA_VANTAGE_KEY"),
            secondary_api_key: non_blank("YF_API_KEY"),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("primary_api_key", &mask(&self.primary_api_key))
            .field("secondary_api_key", &mask(&self.secondary_api_key))
            .finish()
    }
}
