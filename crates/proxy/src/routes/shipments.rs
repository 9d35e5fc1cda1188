//! Shipment route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::Response,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use shipdesk_core::ShipmentList;

use super::relay;
use crate::error::AppError;
use crate::shopify::cancel_order_fulfillments;
use crate::state::AppState;

/// Shipment search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub order_ref: String,
}

/// Wake-up endpoint. Never touches the shipment API.
pub async fn ping() -> Json<Value> {
    Json(json!({ "status": "awake" }))
}

/// Search shipments by order reference.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ShipmentList>, AppError> {
    let list = state.shipments().search_by_order_ref(&query.order_ref).await?;
    Ok(Json(list))
}

/// Put a shipment on hold.
#[instrument(skip(state))]
pub async fn hold(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let reply = state.shipments().hold(&id).await?;
    Ok(relay(reply))
}

/// Release a held shipment.
#[instrument(skip(state))]
pub async fn release(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let reply = state.shipments().release(&id).await?;
    Ok(relay(reply))
}

/// Archive a shipment.
///
/// The archive is forwarded whatever the shipment's status. When it
/// succeeds and Shopify is configured, open fulfillment orders for the
/// shipment's order are cancelled before responding. Cancellation failures
/// are logged and never change the response.
#[instrument(skip(state))]
pub async fn archive(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let order_ref = match state.shopify() {
        Some(_) => lookup_order_ref(&state, &id).await,
        None => None,
    };

    let reply = state.shipments().archive(&id).await?;

    if reply.is_success()
        && let Some(shopify) = state.shopify()
        && let Some(order_ref) = order_ref
    {
        let report = cancel_order_fulfillments(shopify, &order_ref).await;
        tracing::debug!(shipment_id = %id, ?report, "Cancellation report");
    }

    Ok(relay(reply))
}

/// Order reference of a shipment, or `None` if it can't be determined.
async fn lookup_order_ref(state: &AppState, id: &str) -> Option<String> {
    match state.shipments().fetch_by_id(id).await {
        Ok(Some(shipment)) => {
            if shipment.order_ref.is_none() {
                tracing::info!(shipment_id = %id, "Shipment has no order reference");
            }
            shipment.order_ref
        }
        Ok(None) => {
            tracing::warn!(shipment_id = %id, "Shipment not found before archive");
            None
        }
        Err(e) => {
            tracing::warn!(shipment_id = %id, error = %e, "Shipment lookup before archive failed");
            None
        }
    }
}
