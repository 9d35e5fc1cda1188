//! Order reference parsing.
//!
//! Shipments carry the storefront's human-readable order reference (e.g.
//! `#1001`). Shopify order lookups filter on the bare number.

use thiserror::Error;

/// Marker Shopify prefixes to order names.
pub const ORDER_NAME_MARKER: char = '#';

/// Errors from parsing an order reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderRefError {
    /// The reference was empty or whitespace only.
    #[error("order reference is empty")]
    Empty,
}

/// Strip surrounding whitespace and a single leading `#` from an order reference.
///
/// ```
/// # use shipdesk_core::order_number_from_ref;
/// assert_eq!(order_number_from_ref("#2002").unwrap(), "2002");
/// assert_eq!(order_number_from_ref("2002").unwrap(), "2002");
/// ```
///
/// # Errors
///
/// Returns `OrderRefError::Empty` if nothing remains after stripping.
pub fn order_number_from_ref(order_ref: &str) -> Result<String, OrderRefError> {
    let trimmed = order_ref.trim();
    let number = trimmed
        .strip_prefix(ORDER_NAME_MARKER)
        .unwrap_or(trimmed)
        .trim();

    if number.is_empty() {
        return Err(OrderRefError::Empty);
    }
    Ok(number.to_string())
}

/// Whether an order name (as Shopify returns it, e.g. `#2002`) names `number`.
#[must_use]
pub fn order_name_matches(name: &str, number: &str) -> bool {
    order_number_from_ref(name).is_ok_and(|n| n == number)
}
