//! Shipment Desk Core - Shared types library.
//!
//! This crate provides common types used across the Shipment Desk components:
//! - `proxy` - HTTP proxy in front of the shipment API, plus the support widget
//! - `integration-tests` - end-to-end tests against fake upstreams
//!
//! # Architecture
//!
//! The core crate contains only types and pure lookup tables - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Shipment model, status tables, and order reference parsing

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
