//! Core types for Shipment Desk.
//!
//! This module provides typed views over the shipment API's payloads and the
//! static tables the widget renders from.

pub mod id;
pub mod lenient;
pub mod order_ref;
pub mod shipment;
pub mod status;

pub use id::ResourceId;
pub use order_ref::{OrderRefError, order_number_from_ref};
pub use shipment::{Product, Shipment, ShipmentAddress, ShipmentItem, ShipmentList};
pub use status::*;
