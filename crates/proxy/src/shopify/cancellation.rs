//! Fulfillment cancellation after a shipment is archived.
//!
//! Every failure here is logged and swallowed. The archive response never
//! depends on what happens in Shopify.

use serde::Serialize;
use tracing::instrument;

use shipdesk_core::order_number_from_ref;

use super::ShopifyClient;
use super::queries::{FulfillmentOrderNode, OrderNode};

/// Message attached to every cancellation request.
pub const CANCELLATION_MESSAGE: &str = "Shipment archived in the support desk";

/// How far the pipeline got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationOutcome {
    /// The order reference was blank after normalization.
    InvalidOrderRef,
    /// The order lookup request failed.
    LookupFailed,
    /// No order name matched the number exactly.
    OrderNotFound,
    /// Cancellation requests were attempted (possibly zero).
    Processed,
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct CancellationReport {
    pub order_number: Option<String>,
    pub order_id: Option<String>,
    pub outcome: CancellationOutcome,
    pub attempted: usize,
    pub cancelled: usize,
    pub failed: usize,
}

impl CancellationReport {
    const fn stopped(order_number: Option<String>, outcome: CancellationOutcome) -> Self {
        Self {
            order_number,
            order_id: None,
            outcome,
            attempted: 0,
            cancelled: 0,
            failed: 0,
        }
    }
}

/// Fulfillment orders of `order` that still need a cancellation request.
#[must_use]
pub fn cancellable_fulfillment_orders(order: &OrderNode) -> Vec<&FulfillmentOrderNode> {
    order
        .fulfillment_orders
        .nodes
        .iter()
        .filter(|fo| fo.is_cancellable())
        .collect()
}

/// Request cancellation of every open fulfillment order for `order_ref`.
///
/// Uses the first order whose name matches exactly. Each fulfillment order is
/// attempted independently; one failing does not stop the others.
#[instrument(skip(client))]
pub async fn cancel_order_fulfillments(
    client: &ShopifyClient,
    order_ref: &str,
) -> CancellationReport {
    let Ok(order_number) = order_number_from_ref(order_ref) else {
        tracing::warn!("Blank order reference, skipping fulfillment cancellation");
        return CancellationReport::stopped(None, CancellationOutcome::InvalidOrderRef);
    };

    let orders = match client.find_orders_by_number(&order_number).await {
        Ok(orders) => orders,
        Err(e) => {
            tracing::warn!(order_number = %order_number, error = %e, "Order lookup failed");
            return CancellationReport::stopped(
                Some(order_number),
                CancellationOutcome::LookupFailed,
            );
        }
    };

    let Some(order) = orders.first() else {
        tracing::warn!(order_number = %order_number, "No matching order found");
        return CancellationReport::stopped(Some(order_number), CancellationOutcome::OrderNotFound);
    };

    let pending = cancellable_fulfillment_orders(order);
    let mut report = CancellationReport {
        order_number: Some(order_number),
        order_id: Some(order.id.clone()),
        outcome: CancellationOutcome::Processed,
        attempted: pending.len(),
        cancelled: 0,
        failed: 0,
    };

    for fulfillment_order in pending {
        match client
            .submit_cancellation_request(&fulfillment_order.id, CANCELLATION_MESSAGE)
            .await
        {
            Ok(()) => report.cancelled += 1,
            Err(e) => {
                report.failed += 1;
                tracing::warn!(
                    fulfillment_order_id = %fulfillment_order.id,
                    error = %e,
                    "Fulfillment cancellation request failed"
                );
            }
        }
    }

    tracing::info!(
        order_id = ?report.order_id,
        attempted = report.attempted,
        cancelled = report.cancelled,
        failed = report.failed,
        "Fulfillment cancellation finished"
    );

    report
}
