//! GraphQL documents and response shapes for the Shopify Admin API.

use serde::Deserialize;

/// Orders matching a search query, with their fulfillment orders.
pub const ORDERS_BY_NAME: &str = r"
query OrdersByName($query: String!) {
    orders(first: 5, query: $query) {
        nodes {
            id
            name
            fulfillmentOrders(first: 25) {
                nodes {
                    id
                    status
                    requestStatus
                }
            }
        }
    }
}
";

/// Ask the fulfillment service to cancel a fulfillment order.
pub const SUBMIT_CANCELLATION_REQUEST: &str = r"
mutation SubmitCancellationRequest($id: ID!, $message: String) {
    fulfillmentOrderSubmitCancellationRequest(id: $id, message: $message) {
        fulfillmentOrder {
            id
            status
            requestStatus
        }
        userErrors {
            field
            message
        }
    }
}
";

/// `FulfillmentOrderStatus` value for a cancelled fulfillment order.
pub const STATUS_CANCELLED: &str = "CANCELLED";

/// `FulfillmentOrderRequestStatus` values meaning cancellation is already underway.
pub const CANCELLATION_REQUEST_STATUSES: &[&str] =
    &["CANCELLATION_REQUESTED", "CANCELLATION_ACCEPTED"];

/// Generic `{ nodes: [...] }` connection.
#[derive(Debug, Clone, Deserialize)]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

/// Response data for [`ORDERS_BY_NAME`].
#[derive(Debug, Clone, Deserialize)]
pub struct OrdersByNameData {
    pub orders: Connection<OrderNode>,
}

/// An order with its fulfillment orders.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderNode {
    /// Order GID (e.g., `gid://shopify/Order/123`).
    pub id: String,
    /// Order name (e.g., `#1001`).
    pub name: String,
    pub fulfillment_orders: Connection<FulfillmentOrderNode>,
}

/// A fulfillment order and its cancellation-relevant state.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentOrderNode {
    /// Fulfillment order GID.
    pub id: String,
    /// `FulfillmentOrderStatus` (e.g., `OPEN`, `IN_PROGRESS`, `CANCELLED`).
    pub status: String,
    /// `FulfillmentOrderRequestStatus` (e.g., `ACCEPTED`, `CANCELLATION_REQUESTED`).
    #[serde(default)]
    pub request_status: Option<String>,
}

impl FulfillmentOrderNode {
    /// Whether a cancellation request should still be submitted.
    #[must_use]
    pub fn is_cancellable(&self) -> bool {
        let cancelled = self.status.eq_ignore_ascii_case(STATUS_CANCELLED);
        let requested = self.request_status.as_deref().is_some_and(|request| {
            CANCELLATION_REQUEST_STATUSES
                .iter()
                .any(|s| request.eq_ignore_ascii_case(s))
        });
        !cancelled && !requested
    }
}

/// Response data for [`SUBMIT_CANCELLATION_REQUEST`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCancellationRequestData {
    pub fulfillment_order_submit_cancellation_request: Option<SubmitCancellationRequestPayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCancellationRequestPayload {
    pub fulfillment_order: Option<FulfillmentOrderNode>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

/// A mutation user error.
#[derive(Debug, Clone, Deserialize)]
pub struct UserError {
    pub field: Option<Vec<String>>,
    pub message: String,
}

impl std::fmt::Display for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let field = self.field.as_ref().map_or_else(String::new, |f| f.join("."));
        write!(f, "{}: {}", field, self.message)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(status: &str, request_status: Option<&str>) -> FulfillmentOrderNode {
        FulfillmentOrderNode {
            id: "gid://shopify/FulfillmentOrder/1".to_string(),
            status: status.to_string(),
            request_status: request_status.map(String::from),
        }
    }

    #[test]
    fn test_open_fulfillment_orders_are_cancellable() {
        assert!(node("OPEN", Some("UNSUBMITTED")).is_cancellable());
        assert!(node("IN_PROGRESS", Some("ACCEPTED")).is_cancellable());
        assert!(node("OPEN", None).is_cancellable());
    }

    #[test]
    fn test_cancelled_or_requested_are_skipped() {
        assert!(!node("CANCELLED", Some("ACCEPTED")).is_cancellable());
        assert!(!node("cancelled", None).is_cancellable());
        assert!(!node("IN_PROGRESS", Some("CANCELLATION_REQUESTED")).is_cancellable());
        assert!(!node("IN_PROGRESS", Some("CANCELLATION_ACCEPTED")).is_cancellable());
    }

    #[test]
    fn test_orders_by_name_response_parses() {
        let data: OrdersByNameData = serde_json::from_value(json!({
            "orders": { "nodes": [{
                "id": "gid://shopify/Order/9",
                "name": "#2002",
                "fulfillmentOrders": { "nodes": [
                    { "id": "gid://shopify/FulfillmentOrder/1", "status": "OPEN", "requestStatus": "ACCEPTED" }
                ]}
            }]}
        }))
        .unwrap();

        let order = &data.orders.nodes[0];
        assert_eq!(order.name, "#2002");
        assert_eq!(order.fulfillment_orders.nodes.len(), 1);
        assert_eq!(
            order.fulfillment_orders.nodes[0].request_status.as_deref(),
            Some("ACCEPTED")
        );
    }

    #[test]
    fn test_user_error_display() {
        let err = UserError {
            field: Some(vec!["id".to_string()]),
            message: "not cancellable".to_string(),
        };
        assert_eq!(err.to_string(), "id: not cancellable");
    }
}
