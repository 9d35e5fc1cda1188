//! Shipment API authentication.
//!
//! Handles email/password login and the single in-memory bearer token slot.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::instrument;
use url::Url;

use super::ShipmentApiError;
use crate::config::ShipmentApiConfig;

/// Login path, relative to the shipment API base URL.
const LOGIN_PATH: &str = "auth/login";

/// How long a token is reused after login.
///
/// The provider issues tokens valid for about an hour; refreshing at 50
/// minutes keeps in-flight requests clear of the cutoff.
pub const TOKEN_LIFETIME_MINUTES: i64 = 50;

/// A bearer token and the instant it stops being reused.
#[derive(Clone)]
pub struct CachedToken {
    value: SecretString,
    expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedToken")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl CachedToken {
    /// Create a token that expires at the given instant.
    #[must_use]
    pub const fn new(value: SecretString, expires_at: DateTime<Utc>) -> Self {
        Self { value, expires_at }
    }

    /// Create a token obtained at `now`, expiring after the standard lifetime.
    #[must_use]
    pub fn issued_at(value: SecretString, now: DateTime<Utc>) -> Self {
        Self::new(value, now + Duration::minutes(TOKEN_LIFETIME_MINUTES))
    }

    /// Whether the token may still be used at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Instant the token stops being reused.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// The bearer token.
    #[must_use]
    pub const fn value(&self) -> &SecretString {
        &self.value
    }
}

/// Request body for login.
#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Response from the login endpoint.
#[derive(Deserialize)]
struct LoginResponse {
    #[serde(alias = "token", alias = "accessToken")]
    access_token: String,
}

/// Log in with email and password.
///
/// # Errors
///
/// Returns `ShipmentApiError::AuthenticationFailed` with the upstream status
/// and body if login is rejected, `ShipmentApiError::Protocol` if the success
/// body carries no token, or `ShipmentApiError::Http` on transport failure.
#[instrument(skip(client, password), fields(email = %email))]
pub async fn login(
    client: &reqwest::Client,
    login_url: &Url,
    email: &str,
    password: &SecretString,
) -> Result<SecretString, ShipmentApiError> {
    let response = client
        .post(login_url.clone())
        .json(&LoginRequest {
            email,
            password: password.expose_secret(),
        })
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), "Shipment API login rejected");
        return Err(ShipmentApiError::AuthenticationFailed {
            status: status.as_u16(),
            body,
        });
    }

    let parsed: LoginResponse =
        serde_json::from_str(&body).map_err(|_| ShipmentApiError::Protocol {
            status: status.as_u16(),
            raw: body.clone(),
        })?;

    Ok(SecretString::from(parsed.access_token))
}

/// Process-wide bearer token cache.
///
/// Holds at most one token. Callers that find it missing or expired log in
/// themselves; the lock is never held across the login request, so callers
/// racing an expiry may each log in once. The last writer wins.
pub struct TokenCache {
    client: reqwest::Client,
    login_url: Url,
    email: String,
    password: SecretString,
    slot: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    /// Create an empty cache for the configured account.
    ///
    /// # Errors
    ///
    /// Returns `ShipmentApiError::Url` if the login URL cannot be built.
    pub fn new(client: reqwest::Client, config: &ShipmentApiConfig) -> Result<Self, ShipmentApiError> {
        Ok(Self {
            client,
            login_url: config.base_url.join(LOGIN_PATH)?,
            email: config.email.clone(),
            password: config.password.clone(),
            slot: RwLock::new(None),
        })
    }

    /// Return the cached token, logging in first if it is missing or expired.
    ///
    /// # Errors
    ///
    /// Returns the login error if a new token is needed and login fails.
    pub async fn get_token(&self) -> Result<SecretString, ShipmentApiError> {
        if let Some(token) = self.slot.read().await.as_ref()
            && token.is_valid_at(Utc::now())
        {
            return Ok(token.value.clone());
        }

        tracing::debug!("Shipment API token missing or expired, logging in");
        let value = login(&self.client, &self.login_url, &self.email, &self.password).await?;
        let token = CachedToken::issued_at(value.clone(), Utc::now());
        tracing::info!(expires_at = %token.expires_at, "Shipment API token refreshed");
        *self.slot.write().await = Some(token);

        Ok(value)
    }

    /// Current cached token, if any (expired or not).
    pub async fn cached(&self) -> Option<CachedToken> {
        self.slot.read().await.clone()
    }

    /// Replace the cached token.
    pub async fn set_token(&self, token: CachedToken) {
        *self.slot.write().await = Some(token);
    }

    /// Drop the cached token so the next call logs in.
    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }
}
