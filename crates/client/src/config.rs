//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//! - `FASTBITE_API_URL` - Backend API base, including the `/api` prefix
//!   (default: `http://127.0.0.1:8080/api`)
//! - `FASTBITE_STATE_DIR` - Directory holding persisted session and cart state
//!   (default: `.fastbite`)
//! - `FASTBITE_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `FASTBITE_STREAM_RETRY_MS` - Initial live-channel reconnect delay (default: 3000)
//! - `FASTBITE_STREAM_BUFFER` - Per-subscription delivery buffer (default: 64)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8080/api";
const DEFAULT_STATE_DIR: &str = ".fastbite";
const DEFAULT_REQUEST_TIMEOUT_SECS: &str = "30";
const DEFAULT_STREAM_RETRY_MS: &str = "3000";
const DEFAULT_STREAM_BUFFER: &str = "64";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client runtime configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend API base URL (endpoints are appended to its path)
    pub api_url: Url,
    /// Directory for the file-backed state store
    pub state_dir: PathBuf,
    /// Timeout applied to every gateway request
    pub request_timeout: Duration,
    /// Live channel settings
    pub stream: StreamConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Live channel (server-sent events) configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Delay before the transport reconnects, until the server sends `retry:`
    pub retry_delay: Duration,
    /// Frames buffered between the transport and the handler
    pub buffer: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_millis(3000),
            buffer: 64,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_api_url(&get_env_or_default("FASTBITE_API_URL", DEFAULT_API_URL))?;
        let state_dir = PathBuf::from(get_env_or_default("FASTBITE_STATE_DIR", DEFAULT_STATE_DIR));
        let request_timeout = Duration::from_secs(parse_env(
            "FASTBITE_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?);
        let stream = StreamConfig {
            retry_delay: Duration::from_millis(parse_env(
                "FASTBITE_STREAM_RETRY_MS",
                DEFAULT_STREAM_RETRY_MS,
            )?),
            buffer: parse_env::<usize>("FASTBITE_STREAM_BUFFER", DEFAULT_STREAM_BUFFER)?.max(1),
        };

        Ok(Self {
            api_url,
            state_dir,
            request_timeout,
            stream,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration pointing at `api_url` with every other setting defaulted.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `api_url` is not an absolute http(s) URL.
    pub fn for_api_url(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_api_url(api_url)?,
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            request_timeout: Duration::from_secs(30),
            stream: StreamConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse the API base, normalizing away a trailing slash so endpoint joins
/// never produce `//`.
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar("FASTBITE_API_URL".to_string(), reason);

    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    let trimmed = url.path().trim_end_matches('/').to_string();
    url.set_path(&trimmed);
    Ok(url)
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
