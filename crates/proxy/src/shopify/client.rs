//! Shopify Admin API GraphQL client.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use tracing::instrument;
use url::Url;

use shipdesk_core::types::order_ref::order_name_matches;

use super::queries::{
    self, OrderNode, OrdersByNameData, SubmitCancellationRequestData,
};
use super::{GraphQLError, ShopifyError};
use crate::config::ShopifyConfig;

/// Timeout applied to every Admin API request.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shopify Admin API GraphQL client.
///
/// Holds the Admin API access token for a single store.
#[derive(Clone)]
pub struct ShopifyClient {
    inner: Arc<ShopifyClientInner>,
}

struct ShopifyClientInner {
    client: reqwest::Client,
    endpoint: Url,
    access_token: SecretString,
}

/// GraphQL response wrapper.
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
    #[serde(default)]
    path: Vec<serde_json::Value>,
}

impl ShopifyClient {
    /// Create a new Admin API client.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Url` if the GraphQL endpoint cannot be built,
    /// or `ShopifyError::Http` if the HTTP client cannot be created.
    pub fn new(config: &ShopifyConfig) -> Result<Self, ShopifyError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            inner: Arc::new(ShopifyClientInner {
                client,
                endpoint: config.graphql_endpoint()?,
                access_token: config.access_token.clone(),
            }),
        })
    }

    // =========================================================================
    // GraphQL Execution
    // =========================================================================

    /// Execute a GraphQL document.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::RateLimited` on 429, `ShopifyError::Unauthorized`
    /// on 401, `ShopifyError::Api` on other non-success statuses, and
    /// `ShopifyError::GraphQL` if the response carries errors or no data.
    #[instrument(skip(self, query, variables))]
    pub async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, ShopifyError> {
        let body = json!({
            "query": query,
            "variables": variables,
        });

        let response = self
            .inner
            .client
            .post(self.inner.endpoint.clone())
            .header("X-Shopify-Access-Token", self.inner.access_token.expose_secret())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        // Check for rate limiting
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<f64>().ok())
                .map_or(60, |secs| secs.ceil() as u64);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Check for unauthorized
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ShopifyError::Unauthorized(
                "Invalid or expired access token".to_string(),
            ));
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ShopifyError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let graphql_response: GraphQLResponse<T> = response.json().await?;

        // Check for GraphQL errors
        if let Some(errors) = graphql_response.errors
            && !errors.is_empty()
        {
            let converted_errors: Vec<GraphQLError> = errors
                .into_iter()
                .map(|e| GraphQLError {
                    message: e.message,
                    path: e.path,
                })
                .collect();
            return Err(ShopifyError::GraphQL(converted_errors));
        }

        graphql_response.data.ok_or_else(|| {
            ShopifyError::GraphQL(vec![GraphQLError {
                message: "No data in response".to_string(),
                path: vec![],
            }])
        })
    }

    // =========================================================================
    // Orders & fulfillment orders
    // =========================================================================

    /// Find orders whose name is exactly `order_number` (with or without `#`).
    ///
    /// The search filter `name:<number>` is a prefix/fuzzy match on Shopify's
    /// side, so results are filtered again locally.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn find_orders_by_number(
        &self,
        order_number: &str,
    ) -> Result<Vec<OrderNode>, ShopifyError> {
        let variables = json!({ "query": format!("name:{order_number}") });
        let data: OrdersByNameData = self.execute(queries::ORDERS_BY_NAME, variables).await?;

        Ok(data
            .orders
            .nodes
            .into_iter()
            .filter(|order| order_name_matches(&order.name, order_number))
            .collect())
    }

    /// Submit a cancellation request for a fulfillment order.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserError` if Shopify rejects the request, or
    /// another error if the API request fails.
    #[instrument(skip(self, message), fields(fulfillment_order_id = %fulfillment_order_id))]
    pub async fn submit_cancellation_request(
        &self,
        fulfillment_order_id: &str,
        message: &str,
    ) -> Result<(), ShopifyError> {
        let variables = json!({
            "id": fulfillment_order_id,
            "message": message,
        });
        let data: SubmitCancellationRequestData = self
            .execute(queries::SUBMIT_CANCELLATION_REQUEST, variables)
            .await?;

        let Some(payload) = data.fulfillment_order_submit_cancellation_request else {
            return Err(ShopifyError::GraphQL(vec![GraphQLError {
                message: "No payload returned from cancellation request".to_string(),
                path: vec![],
            }]));
        };

        if !payload.user_errors.is_empty() {
            let error_messages: Vec<String> =
                payload.user_errors.iter().map(ToString::to_string).collect();
            return Err(ShopifyError::UserError(error_messages.join("; ")));
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_client_endpoint() {
        let config = ShopifyConfig {
            store: "demo.myshopify.com".to_string(),
            api_version: "2026-01".to_string(),
            access_token: SecretString::from("shpat_test"),
            admin_url: Url::parse("https://demo.myshopify.com/").unwrap(),
        };
        let client = ShopifyClient::new(&config).unwrap();

        assert_eq!(
            client.inner.endpoint.as_str(),
            "https://demo.myshopify.com/admin/api/2026-01/graphql.json"
        );
    }
}
