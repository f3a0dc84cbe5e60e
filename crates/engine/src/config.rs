//! Engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `CARTSYNC_API_BASE_URL` - Order/catalog service base URL (default: `http://localhost:8081`)
//! - `CARTSYNC_STATE_DIR` - Directory holding the persisted `cart`/`products` slots (default: `.cartsync`)
//! - `CARTSYNC_HTTP_TIMEOUT_SECS` - Request timeout for remote calls (default: 10)
//! - `CARTSYNC_PRODUCT_CACHE_TTL_SECS` - TTL for single-product lookups (default: 60)
//! - `CARTSYNC_STOCK_CHECK` - Checkout stock validation, `snapshot` or `catalog` (default: `snapshot`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::checkout::StockPolicy;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8081";
const DEFAULT_STATE_DIR: &str = ".cartsync";

/// Upper bound for configured durations (one year).
pub const MAX_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cartsync engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Remote service configuration
    pub remote: RemoteConfig,
    /// Directory for persisted key-value slots
    pub state_dir: PathBuf,
    /// How checkout validates quantities against stock
    pub stock_policy: StockPolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "production", "staging")
    pub sentry_environment: Option<String>,
}

/// Remote catalog and order service configuration.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL the `/product/` and `/orders` paths are joined onto
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// Time-to-live for cached single-product lookups
    pub product_cache_ttl: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: Duration::from_secs(10),
            product_cache_ttl: Duration::from_secs(60),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let remote = RemoteConfig::from_env()?;
        let state_dir = PathBuf::from(get_env_or_default("CARTSYNC_STATE_DIR", DEFAULT_STATE_DIR));
        let stock_policy = parse_var::<StockPolicy>(
            "CARTSYNC_STOCK_CHECK",
            &get_env_or_default("CARTSYNC_STOCK_CHECK", "snapshot"),
        )?;

        Ok(Self {
            remote,
            state_dir,
            stock_policy,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

impl RemoteConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = parse_base_url(&get_env_or_default(
            "CARTSYNC_API_BASE_URL",
            DEFAULT_API_BASE_URL,
        ))?;
        let timeout = parse_secs(
            "CARTSYNC_HTTP_TIMEOUT_SECS",
            &get_env_or_default("CARTSYNC_HTTP_TIMEOUT_SECS", "10"),
        )?;
        let product_cache_ttl = parse_secs(
            "CARTSYNC_PRODUCT_CACHE_TTL_SECS",
            &get_env_or_default("CARTSYNC_PRODUCT_CACHE_TTL_SECS", "60"),
        )?;

        Ok(Self {
            base_url,
            timeout,
            product_cache_ttl,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn default_base_url() -> Url {
    #[allow(clippy::expect_used)] // Constant URL, covered by tests
    Url::parse(DEFAULT_API_BASE_URL).expect("default base URL is valid")
}

/// Parse a value with `FromStr`, mapping failures to `InvalidEnvVar`.
fn parse_var<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a whole number of seconds, at most [`MAX_DURATION_SECS`].
fn parse_secs(key: &str, value: &str) -> Result<Duration, ConfigError> {
    let secs = parse_var::<u64>(key, value)?;
    if secs > MAX_DURATION_SECS {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be at most {MAX_DURATION_SECS} seconds"),
        ));
    }
    Ok(Duration::from_secs(secs))
}

/// Parse the service base URL; only `http`/`https` are accepted.
fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let url = parse_var::<Url>("CARTSYNC_API_BASE_URL", value)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidEnvVar(
            "CARTSYNC_API_BASE_URL".to_string(),
            format!("unsupported scheme: {other}"),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url() {
        assert_eq!(default_base_url().as_str(), "http://localhost:8081/");
    }

    #[test]
    fn test_parse_base_url_rejects_non_http() {
        let result = parse_base_url("ftp://example.com");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_parse_base_url_rejects_garbage() {
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn test_parse_secs() {
        assert_eq!(parse_secs("T", "30").unwrap(), Duration::from_secs(30));
        assert!(parse_secs("T", "-1").is_err());
        assert!(parse_secs("T", "ten").is_err());
    }

    #[test]
    fn test_parse_secs_rejects_out_of_range() {
        let err = parse_secs("CARTSYNC_PRODUCT_CACHE_TTL_SECS", "99999999999").unwrap_err();
        assert!(matches!(
            &err,
            ConfigError::InvalidEnvVar(key, _) if key == "CARTSYNC_PRODUCT_CACHE_TTL_SECS"
        ));
        assert!(err.to_string().contains("at most 31536000 seconds"));

        let max = MAX_DURATION_SECS.to_string();
        assert_eq!(
            parse_secs("T", &max).unwrap(),
            Duration::from_secs(MAX_DURATION_SECS)
        );
    }

    #[test]
    fn test_parse_stock_policy() {
        assert_eq!(
            parse_var::<StockPolicy>("T", "catalog").unwrap(),
            StockPolicy::LiveCatalog
        );
        assert_eq!(
            parse_var::<StockPolicy>("T", "snapshot").unwrap(),
            StockPolicy::CartSnapshot
        );
        let err = parse_var::<StockPolicy>("CARTSYNC_STOCK_CHECK", "maybe").unwrap_err();
        assert!(err.to_string().contains("CARTSYNC_STOCK_CHECK"));
    }

    #[test]
    fn test_invalid_env_var_display() {
        let err = ConfigError::InvalidEnvVar("CARTSYNC_STATE_DIR".to_string(), "bad".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid environment variable CARTSYNC_STATE_DIR: bad"
        );
    }
}
