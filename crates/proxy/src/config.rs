//! Proxy configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHIPMENT_API_BASE_URL` - Base URL of the shipment API (e.g., `https://api.shipper.example/v1`)
//! - `SHIPMENT_API_EMAIL` - Login email for the shipment API
//! - `SHIPMENT_API_PASSWORD` - Login password for the shipment API
//!
//! ## Optional
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 3000)
//! - `CORS_ALLOWED_ORIGINS` - Comma-separated origins allowed to call the proxy (default: any)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sample rates (default: 1.0)
//!
//! ## Optional (Shopify - enables fulfillment cancellation on archive)
//! - `SHOPIFY_STORE` - Shopify store domain (e.g., your-store.myshopify.com)
//! - `SHOPIFY_ACCESS_TOKEN` - Admin API access token
//! - `SHOPIFY_API_VERSION` - API version (default: 2026-01)
//! - `SHOPIFY_ADMIN_URL` - Origin override for the Admin API (default: `https://{store}`)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_SHOPIFY_API_VERSION: &str = "2026-01";
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Proxy application configuration.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Shipment API configuration
    pub shipment_api: ShipmentApiConfig,
    /// Shopify Admin API configuration (optional - enables cancellation on archive)
    pub shopify: Option<ShopifyConfig>,
    /// Origins allowed by CORS; empty means any origin
    pub cors_allowed_origins: Vec<String>,
    /// Emit JSON logs instead of text
    pub json_logs: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Shipment API configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct ShipmentApiConfig {
    /// Base URL all shipment API paths are joined onto
    pub base_url: Url,
    /// Login email
    pub email: String,
    /// Login password
    pub password: SecretString,
}

impl std::fmt::Debug for ShipmentApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShipmentApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Shopify Admin API configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopifyConfig {
    /// Shopify store domain (e.g., your-store.myshopify.com)
    pub store: String,
    /// Shopify API version (e.g., 2026-01)
    pub api_version: String,
    /// Admin API access token
    pub access_token: SecretString,
    /// Origin the Admin API is reached at
    pub admin_url: Url,
}

impl std::fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("store", &self.store)
            .field("api_version", &self.api_version)
            .field("access_token", &"[REDACTED]")
            .field("admin_url", &self.admin_url.as_str())
            .finish()
    }
}

impl ShopifyConfig {
    /// GraphQL endpoint for the configured API version.
    ///
    /// # Errors
    ///
    /// Returns `url::ParseError` if the joined path is not a valid URL.
    pub fn graphql_endpoint(&self) -> Result<Url, url::ParseError> {
        self.admin_url
            .join(&format!("admin/api/{}/graphql.json", self.api_version))
    }

    fn from_source(get: &impl Fn(&str) -> Option<String>) -> Result<Option<Self>, ConfigError> {
        let store = get_optional(get, "SHOPIFY_STORE");
        let access_token = get_optional(get, "SHOPIFY_ACCESS_TOKEN");

        match (store, access_token) {
            (Some(store), Some(token)) => {
                if let Err(e) = validate_secret_strength(&token, "SHOPIFY_ACCESS_TOKEN") {
                    tracing::warn!("SHOPIFY_ACCESS_TOKEN validation warning: {e}");
                }
                let admin_url = match get_optional(get, "SHOPIFY_ADMIN_URL") {
                    Some(raw) => parse_base_url("SHOPIFY_ADMIN_URL", &raw)?,
                    None => parse_base_url("SHOPIFY_STORE", &format!("https://{store}"))?,
                };
                Ok(Some(Self {
                    store,
                    api_version: get_or_default(get, "SHOPIFY_API_VERSION", DEFAULT_SHOPIFY_API_VERSION),
                    access_token: SecretString::from(token),
                    admin_url,
                }))
            }
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "SHOPIFY_*".to_string(),
                "Both SHOPIFY_STORE and SHOPIFY_ACCESS_TOKEN must be set together".to_string(),
            )),
        }
    }
}

impl ShipmentApiConfig {
    fn from_source(get: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_base = get_required(get, "SHIPMENT_API_BASE_URL")?;
        Ok(Self {
            base_url: parse_base_url("SHIPMENT_API_BASE_URL", &raw_base)?,
            email: get_required(get, "SHIPMENT_API_EMAIL")?,
            password: SecretString::from(get_required(get, "SHIPMENT_API_PASSWORD")?),
        })
    }
}

impl ProxyConfig {
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
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_source(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = get_or_default(&get, "HOST", "0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), e.to_string()))?;
        let port = get_or_default(&get, "PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;

        let shipment_api = ShipmentApiConfig::from_source(&get)?;
        let shopify = ShopifyConfig::from_source(&get)?;

        let cors_allowed_origins = get_optional(&get, "CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        let json_logs = get_optional(&get, "LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"));

        let sentry_dsn = get_optional(&get, "SENTRY_DSN");
        let sentry_environment = get_optional(&get, "SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional(&get, "SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional(&get, "SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            host,
            port,
            shipment_api,
            shopify,
            cors_allowed_origins,
            json_logs,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns a reference to the Shopify configuration, if available.
    ///
    /// Returns `None` if the Shopify variables are not set, which disables
    /// fulfillment cancellation after archiving.
    #[must_use]
    pub const fn shopify(&self) -> Option<&ShopifyConfig> {
        self.shopify.as_ref()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required variable.
fn get_required(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    get_optional(get, key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional variable, treating blank values as unset.
fn get_optional(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    get(key).filter(|value| !value.trim().is_empty())
}

/// Get a variable with a default value.
fn get_or_default(get: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    get_optional(get, key).unwrap_or_else(|| default.to_string())
}

/// Parse a base URL, ensuring a trailing slash so relative joins keep the path.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }
    Ok(url)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}
