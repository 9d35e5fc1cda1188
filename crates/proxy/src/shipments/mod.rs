//! Shipment API client.
//!
//! Wraps the third-party shipment API that support agents search, hold,
//! release, and archive shipments through.
//!
//! # Architecture
//!
//! - Two-layer authentication: email/password → bearer token → API
//! - One bearer token cached in memory for 50 minutes ([`auth::TokenCache`])
//! - JSON in/out; list payloads are relayed with unknown fields intact
//! - No retries: upstream status codes are surfaced to the caller

pub mod auth;
pub mod client;

pub use auth::{CachedToken, TokenCache};
pub use client::{ShipmentClient, UpstreamReply};

use thiserror::Error;

/// Errors that can occur when interacting with the shipment API.
#[derive(Debug, Error)]
pub enum ShipmentApiError {
    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Caller input was rejected before contacting the API.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Login was rejected.
    #[error("Authentication failed: HTTP {status}: {body}")]
    AuthenticationFailed {
        /// Upstream HTTP status.
        status: u16,
        /// Upstream response body.
        body: String,
    },

    /// The API answered with a non-success status.
    #[error("Shipment API error: HTTP {status}: {detail}")]
    Api {
        /// Upstream HTTP status.
        status: u16,
        /// Short description for the caller.
        detail: String,
    },

    /// The API answered with a body that is not the expected JSON.
    #[error("Unexpected response from shipment API (HTTP {status}): {raw}")]
    Protocol {
        /// Upstream HTTP status.
        status: u16,
        /// Raw upstream body.
        raw: String,
    },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A configured URL could not be joined with a request path.
    #[error("Invalid shipment API URL: {0}")]
    Url(#[from] url::ParseError),
}
