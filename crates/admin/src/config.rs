//! Console configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ORDERS_API_BASE_URL` - Base URL of the orders API (e.g. `https://ops.example.com/api`)
//! - `ORDERS_API_TOKEN` - Bearer token issued by the session collaborator
//! - `ORDERS_API_EMAIL` - Account email sent in the `email` header
//!
//! ## Optional
//! - `ORDERS_API_VERSION` - `X-API-VERSION` header value (default: 1)
//! - `ORDERS_API_TIMEOUT_SECS` - HTTP timeout in seconds (default: 30)
//! - `ORDERS_CORRELATION_ID` - Fixed `x-correlationid` (default: a fresh UUID per request)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Sentry error sample rate (default: 1.0)

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_API_VERSION: &str = "1";
const DEFAULT_TIMEOUT_SECS: &str = "30";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Console configuration.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Orders API configuration
    pub api: OrdersApiConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
}

/// Orders API connection settings.
#[derive(Debug, Clone)]
pub struct OrdersApiConfig {
    /// Base URL; endpoint paths are appended to it.
    pub base_url: Url,
    /// Value of the `X-API-VERSION` header.
    pub api_version: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Fixed correlation id; a fresh one is generated per request when `None`.
    pub correlation_id: Option<String>,
    /// Credentials supplied by the session collaborator.
    pub credentials: SessionCredentials,
}

impl OrdersApiConfig {
    /// Build a configuration with default version, timeout and correlation id.
    #[must_use]
    pub fn new(base_url: Url, credentials: SessionCredentials) -> Self {
        Self {
            base_url,
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(30),
            correlation_id: None,
            credentials,
        }
    }

    /// Full URL for an endpoint path such as `order/list`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Opaque credentials the console forwards on every request.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct SessionCredentials {
    /// Bearer token
    pub token: SecretString,
    /// Account-identifying email header value
    pub account_email: String,
}

impl SessionCredentials {
    /// Create credentials from a token and account email.
    #[must_use]
    pub fn new(token: impl Into<String>, account_email: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
            account_email: account_email.into(),
        }
    }
}

impl std::fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("token", &"[REDACTED]")
            .field("account_email", &self.account_email)
            .finish()
    }
}

impl ConsoleConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api = OrdersApiConfig::from_lookup(&lookup)?;
        let sentry_dsn = get_optional_env(&lookup, "SENTRY_DSN");
        let sentry_environment = get_optional_env(&lookup, "SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env(&lookup, "SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            api,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
        })
    }
}

impl OrdersApiConfig {
    fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_base = get_required_env(lookup, "ORDERS_API_BASE_URL")?;
        let base_url = Url::parse(&raw_base).map_err(|e| {
            ConfigError::InvalidEnvVar("ORDERS_API_BASE_URL".to_string(), e.to_string())
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "ORDERS_API_BASE_URL".to_string(),
                format!("unsupported scheme '{}'", base_url.scheme()),
            ));
        }

        let timeout_secs = get_env_or_default(lookup, "ORDERS_API_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("ORDERS_API_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            base_url,
            api_version: get_env_or_default(lookup, "ORDERS_API_VERSION", DEFAULT_API_VERSION),
            timeout: Duration::from_secs(timeout_secs),
            correlation_id: get_optional_env(lookup, "ORDERS_CORRELATION_ID"),
            credentials: SessionCredentials {
                token: SecretString::from(get_required_env(lookup, "ORDERS_API_TOKEN")?),
                account_email: get_required_env(lookup, "ORDERS_API_EMAIL")?,
            },
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required variable; blank values count as missing.
fn get_required_env<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    get_optional_env(lookup, key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional variable; blank values count as missing.
fn get_optional_env<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty())
}

/// Get a variable with a default value.
fn get_env_or_default<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    get_optional_env(lookup, key).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("ORDERS_API_BASE_URL", "https://ops.example.com/api/"),
        ("ORDERS_API_TOKEN", "tok-123"),
        ("ORDERS_API_EMAIL", "ops@example.com"),
    ];

    #[test]
    fn test_loads_required_with_defaults() {
        let config = ConsoleConfig::from_lookup(lookup_from(REQUIRED)).unwrap();
        assert_eq!(config.api.api_version, "1");
        assert_eq!(config.api.timeout, Duration::from_secs(30));
        assert!(config.api.correlation_id.is_none());
        assert_eq!(config.api.credentials.token.expose_secret(), "tok-123");
        assert_eq!(config.api.credentials.account_email, "ops@example.com");
        assert!(config.sentry_dsn.is_none());
        assert!((config.sentry_sample_rate - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_missing_token() {
        let pairs: Vec<_> = REQUIRED
            .iter()
            .copied()
            .filter(|(k, _)| *k != "ORDERS_API_TOKEN")
            .collect();
        let err = ConsoleConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "ORDERS_API_TOKEN"));
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("ORDERS_API_EMAIL", "   "));
        let lookup = lookup_from(&pairs);
        let err = ConsoleConfig::from_lookup(lookup).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }

    #[test]
    fn test_invalid_base_url() {
        let mut pairs = REQUIRED.to_vec();
        pairs.retain(|(k, _)| *k != "ORDERS_API_BASE_URL");
        pairs.push(("ORDERS_API_BASE_URL", "ftp://ops.example.com"));
        let err = ConsoleConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_invalid_timeout() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("ORDERS_API_TIMEOUT_SECS", "soon"));
        let err = ConsoleConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "ORDERS_API_TIMEOUT_SECS"));
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = ConsoleConfig::from_lookup(lookup_from(REQUIRED)).unwrap();
        assert_eq!(
            config.api.endpoint("order/list"),
            "https://ops.example.com/api/order/list"
        );
        assert_eq!(
            config.api.endpoint("/order/details"),
            "https://ops.example.com/api/order/details"
        );
    }

    #[test]
    fn test_credentials_debug_redacts_token() {
        let credentials = SessionCredentials::new("super_secret_bearer", "ops@example.com");
        let debug_output = format!("{credentials:?}");

        // Public fields should be visible
        assert!(debug_output.contains("ops@example.com"));

        // Secret fields should be redacted
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_bearer"));
    }
}
