//! HTTP route handlers for the proxy.
//!
//! # Route Structure
//!
//! ```text
//! GET   /health                   - Liveness check
//!
//! # Shipments
//! GET   /shipment/ping            - Wake-up check for the widget host
//! GET   /shipment?order_ref=      - Search shipments, most recent first
//! PUT   /shipment/{id}/hold       - Hold (upstream status relayed)
//! PUT   /shipment/{id}/release    - Release (upstream status relayed)
//! PATCH /shipment/{id}/archive    - Archive, then cancel Shopify fulfillments
//!
//! # Products
//! GET   /product/{id}             - Product payload
//!
//! # Widget
//! GET   /widget?order_ref=        - Server-rendered support widget
//! ```

pub mod products;
pub mod shipments;
pub mod widget;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, put},
};

use crate::shipments::UpstreamReply;
use crate::state::AppState;

/// Create the shipment routes router.
pub fn shipment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(shipments::search))
        .route("/ping", get(shipments::ping))
        .route("/{id}/hold", put(shipments::hold))
        .route("/{id}/release", put(shipments::release))
        .route("/{id}/archive", patch(shipments::archive))
}

/// Create all routes for the proxy.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/shipment", shipment_routes())
        .route("/product/{id}", get(products::show))
        .route("/widget", get(widget::show))
}

/// Liveness check.
async fn health() -> &'static str {
    "ok"
}

/// Relay an upstream status and JSON body as-is.
pub(crate) fn relay(reply: UpstreamReply) -> Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, Json(reply.body)).into_response()
}
