//! Shipment API HTTP client.
//!
//! Every call obtains a bearer token from the [`TokenCache`] and relays
//! upstream status codes instead of retrying.

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::ACCEPT;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::instrument;
use url::Url;

use shipdesk_core::{Product, Shipment, ShipmentList};

use super::ShipmentApiError;
use super::auth::TokenCache;
use crate::config::ShipmentApiConfig;

/// Timeout applied to every shipment API request.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Status and JSON body of a shipment action, relayed verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    /// Upstream HTTP status.
    pub status: u16,
    /// Parsed upstream body (`null` when the body was empty).
    pub body: Value,
}

impl UpstreamReply {
    /// Whether the upstream status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Single-resource responses come wrapped in `data`, but some endpoints
/// return the bare object.
#[derive(Deserialize)]
#[serde(untagged)]
enum DataEnvelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> DataEnvelope<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

/// Shipment API client.
///
/// Cheap to clone; clones share the HTTP connection pool and token cache.
#[derive(Clone)]
pub struct ShipmentClient {
    inner: Arc<ShipmentClientInner>,
}

struct ShipmentClientInner {
    client: reqwest::Client,
    base_url: Url,
    tokens: TokenCache,
}

impl ShipmentClient {
    /// Create a client with an empty token cache.
    ///
    /// # Errors
    ///
    /// Returns `ShipmentApiError::Http` if the HTTP client cannot be built or
    /// `ShipmentApiError::Url` if the login URL cannot be derived.
    pub fn new(config: &ShipmentApiConfig) -> Result<Self, ShipmentApiError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        let tokens = TokenCache::new(client.clone(), config)?;

        Ok(Self {
            inner: Arc::new(ShipmentClientInner {
                client,
                base_url: config.base_url.clone(),
                tokens,
            }),
        })
    }

    /// The token cache backing this client.
    #[must_use]
    pub fn tokens(&self) -> &TokenCache {
        &self.inner.tokens
    }

    // =========================================================================
    // Shipments
    // =========================================================================

    /// Search shipments by storefront order reference, most recent first.
    ///
    /// Shipments are returned as raw JSON so the caller can relay them
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns `ShipmentApiError::InvalidInput` for a blank reference (no
    /// request is made), `ShipmentApiError::NotFound` when the API answers
    /// 404, and `ShipmentApiError::Api` for any other non-success status.
    #[instrument(skip(self))]
    pub async fn search_by_order_ref(&self, order_ref: &str) -> Result<ShipmentList, ShipmentApiError> {
        // Blank-checked trimmed, forwarded as given.
        if order_ref.trim().is_empty() {
            return Err(ShipmentApiError::InvalidInput(
                "order_ref must be a non-empty string".to_string(),
            ));
        }

        let mut url = self.endpoint(&["shipments"])?;
        url.query_pairs_mut().append_pair("order_ref", order_ref);

        let response = self.send(Method::GET, url).await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ShipmentApiError::NotFound("No shipments found".to_string()));
        }
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Shipment search failed upstream");
            return Err(ShipmentApiError::Api {
                status: status.as_u16(),
                detail: "Failed to fetch shipments".to_string(),
            });
        }

        let mut list: ShipmentList = read_json(response).await?;
        list.sort_by_updated_desc();
        tracing::debug!(count = list.data.len(), "Shipments found");
        Ok(list)
    }

    /// Fetch a shipment by ID. Returns `None` if the API answers 404.
    ///
    /// # Errors
    ///
    /// Returns `ShipmentApiError::Api` for non-success statuses other than 404
    /// and `ShipmentApiError::Protocol` if the body is not a shipment.
    #[instrument(skip(self))]
    pub async fn fetch_by_id(&self, id: &str) -> Result<Option<Shipment>, ShipmentApiError> {
        let url = self.endpoint(&["shipments", id])?;
        let response = self.send(Method::GET, url).await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ShipmentApiError::Api {
                status: status.as_u16(),
                detail: "Failed to fetch shipment".to_string(),
            });
        }

        let envelope: DataEnvelope<Shipment> = read_json(response).await?;
        Ok(Some(envelope.into_inner()))
    }

    /// Put a shipment on hold.
    ///
    /// # Errors
    ///
    /// See [`Self::archive`].
    #[instrument(skip(self))]
    pub async fn hold(&self, id: &str) -> Result<UpstreamReply, ShipmentApiError> {
        self.action(Method::PUT, id, "hold").await
    }

    /// Release a held shipment.
    ///
    /// # Errors
    ///
    /// See [`Self::archive`].
    #[instrument(skip(self))]
    pub async fn release(&self, id: &str) -> Result<UpstreamReply, ShipmentApiError> {
        self.action(Method::PUT, id, "release").await
    }

    /// Archive a shipment.
    ///
    /// The upstream status is returned as-is, including non-success statuses;
    /// the API decides whether the transition is allowed.
    ///
    /// # Errors
    ///
    /// Returns `ShipmentApiError::Protocol` with the raw text if the body is
    /// not JSON, or a transport/authentication error.
    #[instrument(skip(self))]
    pub async fn archive(&self, id: &str) -> Result<UpstreamReply, ShipmentApiError> {
        self.action(Method::PATCH, id, "archive").await
    }

    async fn action(
        &self,
        method: Method,
        id: &str,
        action: &str,
    ) -> Result<UpstreamReply, ShipmentApiError> {
        let url = self.endpoint(&["shipments", id, action])?;
        let response = self.send(method, url).await?;
        let status = response.status().as_u16();
        let raw = response.text().await?;

        let body = if raw.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&raw).map_err(|_| {
                tracing::warn!(status, action, "Shipment action returned a non-JSON body");
                ShipmentApiError::Protocol { status, raw }
            })?
        };

        tracing::info!(status, action, shipment_id = %id, "Shipment action forwarded");
        Ok(UpstreamReply { status, body })
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Fetch a product payload by numeric ID, relayed as JSON.
    ///
    /// # Errors
    ///
    /// Returns `ShipmentApiError::InvalidInput` if `id` is not numeric (no
    /// request is made), `ShipmentApiError::NotFound` on 404, and
    /// `ShipmentApiError::Api` for other non-success statuses.
    #[instrument(skip(self))]
    pub async fn fetch_product(&self, id: &str) -> Result<Value, ShipmentApiError> {
        let id = parse_product_id(id)?;
        let url = self.endpoint(&["products", &id.to_string()])?;
        let response = self.send(Method::GET, url).await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ShipmentApiError::NotFound("Product not found".to_string()));
        }
        if !status.is_success() {
            return Err(ShipmentApiError::Api {
                status: status.as_u16(),
                detail: "Failed to fetch product".to_string(),
            });
        }

        read_json(response).await
    }

    /// Fetch a product as a typed [`Product`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::fetch_product`], plus `ShipmentApiError::Protocol` if
    /// the payload is not a product.
    pub async fn product(&self, id: &str) -> Result<Product, ShipmentApiError> {
        let payload = self.fetch_product(id).await?;
        serde_json::from_value::<DataEnvelope<Product>>(payload.clone())
            .map(DataEnvelope::into_inner)
            .map_err(|_| ShipmentApiError::Protocol {
                status: 200,
                raw: payload.to_string(),
            })
    }

    // =========================================================================
    // Request plumbing
    // =========================================================================

    /// Build a URL under the base URL from path segments.
    ///
    /// Segments are percent-encoded, so IDs cannot escape their position.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ShipmentApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ShipmentApiError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send an authenticated request. Non-GET requests carry an empty body.
    async fn send(&self, method: Method, url: Url) -> Result<reqwest::Response, ShipmentApiError> {
        let token = self.inner.tokens.get_token().await?;
        let is_get = method == Method::GET;

        let mut request = self
            .inner
            .client
            .request(method, url)
            .bearer_auth(token.expose_secret())
            .header(ACCEPT, "application/json");
        if !is_get {
            request = request.body("");
        }

        Ok(request.send().await?)
    }
}

/// Read a JSON body, mapping unparseable bodies to `Protocol` with the raw text.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ShipmentApiError> {
    let status = response.status().as_u16();
    let raw = response.text().await?;
    serde_json::from_str(&raw).map_err(|_| ShipmentApiError::Protocol { status, raw })
}

/// Validate a product ID as an unsigned integer.
fn parse_product_id(id: &str) -> Result<u64, ShipmentApiError> {
    id.trim()
        .parse::<u64>()
        .map_err(|_| ShipmentApiError::InvalidInput(format!("product id must be numeric, got {id:?}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use serde_json::json;

    fn client(base: &str) -> ShipmentClient {
        ShipmentClient::new(&ShipmentApiConfig {
            base_url: Url::parse(base).unwrap(),
            email: "ops@shop.test".to_string(),
            password: SecretString::from("pw"),
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_joins_and_encodes_segments() {
        let client = client("https://api.shipper.test/v1/");

        assert_eq!(
            client.endpoint(&["shipments", "42", "hold"]).unwrap().as_str(),
            "https://api.shipper.test/v1/shipments/42/hold"
        );
        assert_eq!(
            client.endpoint(&["shipments", "../admin"]).unwrap().as_str(),
            "https://api.shipper.test/v1/shipments/..%2Fadmin"
        );
    }

    #[test]
    fn test_parse_product_id() {
        assert_eq!(parse_product_id("123").unwrap(), 123);
        assert_eq!(parse_product_id(" 7 ").unwrap(), 7);
        assert!(matches!(
            parse_product_id("12a"),
            Err(ShipmentApiError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_product_id("-1"),
            Err(ShipmentApiError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_product_id(""),
            Err(ShipmentApiError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_order_ref_is_rejected_without_login() {
        let client = client("http://127.0.0.1:9/");

        let err = client.search_by_order_ref("   ").await.unwrap_err();

        assert!(matches!(err, ShipmentApiError::InvalidInput(_)));
        assert!(client.tokens().cached().await.is_none());
    }

    #[test]
    fn test_data_envelope_accepts_wrapped_and_bare() {
        let wrapped: DataEnvelope<Product> =
            serde_json::from_value(json!({ "data": { "id": 5, "name": "Mug" } })).unwrap();
        let bare: DataEnvelope<Product> =
            serde_json::from_value(json!({ "id": 5, "name": "Mug" })).unwrap();

        assert_eq!(wrapped.into_inner().name.as_deref(), Some("Mug"));
        assert_eq!(bare.into_inner().name.as_deref(), Some("Mug"));
    }

    #[test]
    fn test_upstream_reply_success_range() {
        let ok = UpstreamReply { status: 204, body: Value::Null };
        let conflict = UpstreamReply { status: 409, body: json!({ "error": "already inactive" }) };
        assert!(ok.is_success());
        assert!(!conflict.is_success());
    }
}
