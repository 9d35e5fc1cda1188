//! Product route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::Value;
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

/// Fetch a product by numeric ID.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let product = state.shipments().fetch_product(&id).await?;
    Ok(Json(product))
}
