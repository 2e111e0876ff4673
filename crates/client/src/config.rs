//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `SCUFFMART_API_URL` - REST base path (default: `http://localhost:5001/api`)
//! - `SCUFFMART_ASSET_URL` - Host serving product images (default: origin of the API URL)
//! - `SCUFFMART_STORAGE_PATH` - Persistent session file (default: `$HOME/.scuffmart/storage.json`)
//! - `SCUFFMART_REQUEST_TIMEOUT_SECS` - HTTP request timeout (default: 30)
//! - `SCUFFMART_NOTIFICATION_TTL_SECS` - How long notifications stay visible (default: 5)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:5001/api";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_NOTIFICATION_TTL_SECS: u64 = 5;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST base path, always ending in `/` so relative joins stay under it
    pub api_url: Url,
    /// Origin that serves uploaded product images
    pub asset_url: Url,
    /// File backing the persisted session (token and user)
    pub storage_path: PathBuf,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Lifetime of a notification before the view layer dismisses it
    pub notification_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_base_url(
            "SCUFFMART_API_URL",
            &get_env_or_default("SCUFFMART_API_URL", DEFAULT_API_URL),
        )?;
        let asset_url = match get_optional_env("SCUFFMART_ASSET_URL") {
            Some(raw) => parse_base_url("SCUFFMART_ASSET_URL", &raw)?,
            None => origin_of(&api_url)?,
        };
        let storage_path = get_optional_env("SCUFFMART_STORAGE_PATH")
            .map_or_else(default_storage_path, PathBuf::from);
        let request_timeout = Duration::from_secs(get_u64_or_default(
            "SCUFFMART_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?);
        let notification_ttl = Duration::from_secs(get_u64_or_default(
            "SCUFFMART_NOTIFICATION_TTL_SECS",
            DEFAULT_NOTIFICATION_TTL_SECS,
        )?);
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            api_url,
            asset_url,
            storage_path,
            request_timeout,
            notification_ttl,
            sentry_dsn,
        })
    }

    /// Build a configuration for a given API base URL with default settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_url` is not an absolute URL.
    pub fn for_api(api_url: &str, storage_path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let api_url = parse_base_url("SCUFFMART_API_URL", api_url)?;
        let asset_url = origin_of(&api_url)?;
        Ok(Self {
            api_url,
            asset_url,
            storage_path: storage_path.into(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            notification_ttl: Duration::from_secs(DEFAULT_NOTIFICATION_TTL_SECS),
            sentry_dsn: None,
        })
    }

    /// Absolute URL of an image path produced by the core `image_path` helpers.
    #[must_use]
    pub fn asset(&self, path: &str) -> String {
        self.asset_url
            .join(path)
            .map_or_else(|_| path.to_owned(), String::from)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Get an unsigned integer environment variable with a default value.
fn get_u64_or_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Parse a base URL and make sure its path ends with a slash.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "URL cannot be used as a base".to_string(),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Scheme, host and port of `url`.
fn origin_of(url: &Url) -> Result<Url, ConfigError> {
    Url::parse(&url.origin().ascii_serialization())
        .map_err(|e| ConfigError::InvalidEnvVar("SCUFFMART_ASSET_URL".to_string(), e.to_string()))
}

/// `$HOME/.scuffmart/storage.json`, or relative to the working directory
/// when `HOME` is unset.
fn default_storage_path() -> PathBuf {
    let base = std::env::var_os("HOME").map_or_else(PathBuf::new, PathBuf::from);
    base.join(".scuffmart").join("storage.json")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let url = parse_base_url("X", "http://localhost:5001/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5001/api/");
        assert_eq!(
            url.join("cart/add").unwrap().as_str(),
            "http://localhost:5001/api/cart/add"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            parse_base_url("SCUFFMART_API_URL", "not a url"),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "SCUFFMART_API_URL"
        ));
    }

    #[test]
    fn test_asset_defaults_to_api_origin() {
        let config = ClientConfig::for_api("https://shop.example.com:8443/api/v1", "/tmp/s.json")
            .unwrap();
        assert_eq!(config.asset_url.as_str(), "https://shop.example.com:8443/");
        assert_eq!(
            config.asset("/phone.jpg"),
            "https://shop.example.com:8443/phone.jpg"
        );
    }
}
