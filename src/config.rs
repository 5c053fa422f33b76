//! Client configuration parsed from environment variables.
//!
//! All values have defaults, so `ClientConfig::from_env()` never fails;
//! unparsable values fall back to the default. URL validation happens when
//! the realtime URL is derived.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use crate::consts::{RECONNECT_DELAY, REQUEST_THROTTLE, VIEWPORT_STATS_DEBOUNCE};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Path of the realtime socket endpoint on the server host.
pub const REALTIME_PATH: &str = "/ws/flux";

/// Error returned when a realtime URL cannot be derived from the base URL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid base URL (expected http:// or https://): {0}")]
    InvalidBaseUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server origin, e.g. `http://127.0.0.1:8080`. REST calls go to `{base_url}/api`.
    pub base_url: String,
    /// Explicit realtime socket URL; derived from `base_url` when absent.
    pub ws_url: Option<String>,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Minimum spacing between viewport-triggered fetches.
    pub request_throttle: Duration,
    /// Delay before reconnecting after an abnormal socket close.
    pub reconnect_delay: Duration,
    /// Quiet period before the viewport message count is refreshed.
    pub viewport_stats_debounce: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            ws_url: None,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            request_throttle: REQUEST_THROTTLE,
            reconnect_delay: RECONNECT_DELAY,
            viewport_stats_debounce: VIEWPORT_STATS_DEBOUNCE,
        }
    }
}

impl ClientConfig {
    /// Build config from environment variables.
    ///
    /// - `FLUX_BASE_URL`: server origin (default `http://127.0.0.1:8080`)
    /// - `FLUX_WS_URL`: realtime socket URL (default derived from the base URL)
    /// - `FLUX_REQUEST_TIMEOUT_MS`: default 10000
    /// - `FLUX_CONNECT_TIMEOUT_MS`: default 5000
    /// - `FLUX_REQUEST_THROTTLE_MS`: default 1000
    /// - `FLUX_RECONNECT_DELAY_MS`: default 5000
    /// - `FLUX_VIEWPORT_STATS_DEBOUNCE_MS`: default 500
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("FLUX_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.base_url),
            ws_url: std::env::var("FLUX_WS_URL").ok().filter(|s| !s.is_empty()),
            request_timeout: env_millis("FLUX_REQUEST_TIMEOUT_MS", defaults.request_timeout),
            connect_timeout: env_millis("FLUX_CONNECT_TIMEOUT_MS", defaults.connect_timeout),
            request_throttle: env_millis("FLUX_REQUEST_THROTTLE_MS", defaults.request_throttle),
            reconnect_delay: env_millis("FLUX_RECONNECT_DELAY_MS", defaults.reconnect_delay),
            viewport_stats_debounce: env_millis("FLUX_VIEWPORT_STATS_DEBOUNCE_MS", defaults.viewport_stats_debounce),
        }
    }

    /// REST base, e.g. `http://127.0.0.1:8080/api`.
    #[must_use]
    pub fn api_base(&self) -> String {
        format!("{}/api", self.base_url.trim_end_matches('/'))
    }

    /// Realtime socket URL: the explicit `ws_url`, or `ws(s)://{host}/ws/flux`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] when no explicit URL is set and
    /// the base URL is neither `http://` nor `https://`.
    pub fn realtime_url(&self) -> Result<String, ConfigError> {
        if let Some(url) = &self.ws_url {
            return Ok(url.clone());
        }
        let base = self.base_url.trim_end_matches('/');
        if let Some(rest) = base.strip_prefix("http://") {
            return Ok(format!("ws://{rest}{REALTIME_PATH}"));
        }
        if let Some(rest) = base.strip_prefix("https://") {
            return Ok(format!("wss://{rest}{REALTIME_PATH}"));
        }
        Err(ConfigError::InvalidBaseUrl(self.base_url.clone()))
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_millis(key: &str, default: Duration) -> Duration {
    let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(env_parse(key, default_ms))
}
