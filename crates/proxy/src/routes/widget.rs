//! Support widget, rendered server-side for the support-desk iframe.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use shipdesk_core::types::lenient;
use shipdesk_core::{Product, Shipment, ShipmentItem};

use crate::error::AppError;
use crate::shipments::{ShipmentApiError, ShipmentClient};
use crate::state::AppState;

/// Widget query parameters.
#[derive(Debug, Deserialize)]
pub struct WidgetQuery {
    #[serde(default)]
    pub order_ref: String,
}

/// Widget page template.
#[derive(Template, WebTemplate)]
#[template(path = "widget/index.html")]
pub struct WidgetTemplate {
    pub order_ref: String,
    pub cards: Vec<ShipmentCard>,
    pub message: Option<String>,
}

/// One shipment as the widget shows it.
#[derive(Debug, Clone)]
pub struct ShipmentCard {
    pub id: String,
    pub status_label: &'static str,
    pub status_color: &'static str,
    pub address: Option<String>,
    pub tracking: Option<String>,
    pub updated_at: Option<String>,
    pub can_archive: bool,
    pub can_edit: bool,
    pub items: Vec<ItemRow>,
}

/// A line item, enriched with catalog data where the shipment lacks it.
#[derive(Debug, Clone)]
pub struct ItemRow {
    pub name: String,
    pub sku: Option<String>,
    pub quantity: i64,
    pub image_url: Option<String>,
}

impl ShipmentCard {
    /// Build a card from a shipment, using any products already fetched.
    ///
    /// A shipment without an ID gets no action buttons.
    #[must_use]
    pub fn new(shipment: &Shipment, products: &HashMap<String, Product>) -> Self {
        let status = shipment.status();
        let updated_at = shipment
            .updated_at()
            .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
            .or_else(|| shipment.updated_at.as_ref().and_then(lenient::text));
        let has_id = shipment.id.is_some();

        Self {
            id: shipment.id.as_ref().map(ToString::to_string).unwrap_or_default(),
            status_label: status.label(),
            status_color: status.color(),
            address: shipment
                .address
                .as_ref()
                .map(shipdesk_core::ShipmentAddress::one_line)
                .filter(|line| !line.is_empty()),
            tracking: shipment.tracking_number(),
            updated_at,
            can_archive: has_id && status.can_archive(),
            can_edit: has_id && status.can_edit(),
            items: shipment
                .items
                .iter()
                .map(|item| ItemRow::new(item, products))
                .collect(),
        }
    }
}

impl ItemRow {
    fn new(item: &ShipmentItem, products: &HashMap<String, Product>) -> Self {
        let product = item
            .product_id
            .as_ref()
            .and_then(|id| products.get(&id.to_string()));

        let name = item
            .name
            .clone()
            .or_else(|| product.and_then(|p| p.name.clone()))
            .unwrap_or_else(|| "Unnamed item".to_string());

        Self {
            name,
            sku: item.sku.clone().or_else(|| product.and_then(|p| p.sku.clone())),
            quantity: item.quantity.unwrap_or(1),
            image_url: product.and_then(|p| p.image_url.clone()),
        }
    }
}

/// Render the widget for an order reference.
///
/// A blank reference renders the search box with a 400 status. No matching
/// shipments renders an empty state.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Query(query): Query<WidgetQuery>,
) -> Result<Response, AppError> {
    let order_ref = query.order_ref.trim().to_string();

    let list = match state.shipments().search_by_order_ref(&query.order_ref).await {
        Ok(list) => list,
        Err(ShipmentApiError::InvalidInput(_)) => {
            let page = WidgetTemplate {
                order_ref,
                cards: Vec::new(),
                message: Some("Enter an order reference to look up shipments.".to_string()),
            };
            return Ok((StatusCode::BAD_REQUEST, page).into_response());
        }
        Err(ShipmentApiError::NotFound(_)) => {
            return Ok(WidgetTemplate {
                message: Some(format!("No shipments found for {order_ref}.")),
                order_ref,
                cards: Vec::new(),
            }
            .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let shipments = list.shipments();
    let products = fetch_products(state.shipments(), &shipments).await;
    let cards: Vec<ShipmentCard> = shipments
        .iter()
        .map(|shipment| ShipmentCard::new(shipment, &products))
        .collect();
    let message = cards
        .is_empty()
        .then(|| format!("No shipments found for {order_ref}."));

    Ok(WidgetTemplate {
        order_ref,
        cards,
        message,
    }
    .into_response())
}

/// Fetch catalog entries for items missing a name or SKU.
///
/// Each product is fetched once. Failures are skipped; the item keeps
/// whatever the shipment carried.
async fn fetch_products(client: &ShipmentClient, shipments: &[Shipment]) -> HashMap<String, Product> {
    let mut products = HashMap::new();

    let wanted = shipments
        .iter()
        .flat_map(|shipment| &shipment.items)
        .filter(|item| item.name.is_none() || item.sku.is_none())
        .filter_map(|item| item.product_id.as_ref().map(ToString::to_string));

    for id in wanted {
        if products.contains_key(&id) {
            continue;
        }
        match client.product(&id).await {
            Ok(product) => {
                products.insert(id, product);
            }
            Err(e) => {
                tracing::debug!(product_id = %id, error = %e, "Product enrichment skipped");
            }
        }
    }

    products
}
