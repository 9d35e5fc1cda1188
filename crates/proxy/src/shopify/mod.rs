//! Shopify Admin API client used to cancel fulfillments after archiving.
//!
//! # Architecture
//!
//! - GraphQL revision of the Admin API only (orders query with nested
//!   fulfillment orders, cancellation-request mutation)
//! - Static Admin API access token sent as `X-Shopify-Access-Token`
//! - Optional: without credentials the proxy never contacts Shopify
//!
//! The REST revision's fulfillment endpoints are not used.

pub mod cancellation;
pub mod client;
pub mod queries;

pub use cancellation::{CancellationOutcome, CancellationReport, cancel_order_fulfillments};
pub use client::ShopifyClient;
pub use queries::{FulfillmentOrderNode, OrderNode};

use thiserror::Error;

/// Errors that can occur when interacting with the Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Non-success HTTP status other than 401/429.
    #[error("Shopify API error: HTTP {status}: {body}")]
    Api {
        /// Upstream HTTP status.
        status: u16,
        /// Upstream response body.
        body: String,
    },

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User error from mutation (e.g., fulfillment order not cancellable).
    #[error("User error: {0}")]
    UserError(String),

    /// Configured store URL is invalid.
    #[error("Invalid Shopify URL: {0}")]
    Url(#[from] url::ParseError),
}

/// A GraphQL error returned by the Shopify Admin API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}
