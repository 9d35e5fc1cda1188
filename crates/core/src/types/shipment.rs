//! Shipment, item, and product payloads from the shipment API.
//!
//! Search results are relayed to the widget as raw JSON: [`ShipmentList`]
//! keeps each shipment as a `serde_json::Value` and only reads `updated_at`
//! to order them. [`Shipment`] is a typed view for code that needs specific
//! fields. Every field decodes leniently, so a shipment with an unexpected
//! shape still reaches the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::ResourceId;
use super::lenient;
use super::status::ShipmentStatus;

/// Typed view of a shipment.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Shipment {
    /// Shipment ID.
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub id: Option<ResourceId>,
    /// Storefront order reference (e.g., `#1001`).
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub order_ref: Option<String>,
    /// Raw status string; empty when absent or `null`.
    #[serde(default, deserialize_with = "lenient::string")]
    pub status: String,
    /// Destination address.
    #[serde(default, deserialize_with = "lenient::opt_object")]
    pub address: Option<ShipmentAddress>,
    /// Tracking number, or a tracking object from the carrier.
    #[serde(default, deserialize_with = "lenient::opt_value")]
    pub tracking: Option<Value>,
    /// Items in the shipment. Items that aren't objects are dropped.
    #[serde(default, deserialize_with = "lenient::list")]
    pub items: Vec<ShipmentItem>,
    /// Last modification time as sent by the API (string or epoch number).
    #[serde(default, deserialize_with = "lenient::opt_value")]
    pub updated_at: Option<Value>,
}

impl Shipment {
    /// Parsed status.
    #[must_use]
    pub fn status(&self) -> ShipmentStatus {
        ShipmentStatus::parse(&self.status)
    }

    /// Parsed `updated_at`, if present and in a recognized format.
    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at.as_ref().and_then(lenient::timestamp)
    }

    /// Tracking number for display.
    ///
    /// Accepts a bare string or number, or an object with `number`/`tracking_number`.
    #[must_use]
    pub fn tracking_number(&self) -> Option<String> {
        match self.tracking.as_ref()? {
            Value::Object(obj) => obj
                .get("number")
                .or_else(|| obj.get("tracking_number"))
                .and_then(lenient::text),
            other => lenient::text(other),
        }
        .filter(|number| !number.is_empty())
    }
}

/// Destination address on a shipment. Numeric parts (zip codes) are kept as text.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ShipmentAddress {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub address1: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub address2: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub zip: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub country: Option<String>,
}

impl ShipmentAddress {
    /// Single-line rendering, skipping empty parts.
    #[must_use]
    pub fn one_line(&self) -> String {
        [
            &self.name,
            &self.address1,
            &self.address2,
            &self.city,
            &self.state,
            &self.zip,
            &self.country,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref().map(str::trim))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// A line item inside a shipment.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ShipmentItem {
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub id: Option<ResourceId>,
    /// Product this item refers to; used for enrichment.
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub product_id: Option<ResourceId>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub sku: Option<String>,
    /// Quantity; numeric strings are accepted.
    #[serde(default, deserialize_with = "lenient::opt_integer")]
    pub quantity: Option<i64>,
}

/// List envelope returned by the shipment search endpoint.
///
/// Shipments and envelope members are kept as raw JSON and serialize back
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipmentList {
    /// Matching shipments, as sent upstream.
    #[serde(default, deserialize_with = "lenient::list")]
    pub data: Vec<Value>,
    /// Pagination and other envelope fields, relayed as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ShipmentList {
    /// Sort `data` most-recently-updated first.
    ///
    /// The sort is stable. Shipments without a parseable `updated_at` go last,
    /// in their original order.
    pub fn sort_by_updated_desc(&mut self) {
        self.data.sort_by_cached_key(|shipment| {
            std::cmp::Reverse(shipment.get("updated_at").and_then(lenient::timestamp))
        });
    }

    /// Typed views of the shipments, in list order. Entries that aren't
    /// objects are skipped.
    #[must_use]
    pub fn shipments(&self) -> Vec<Shipment> {
        self.data
            .iter()
            .filter_map(|value| Shipment::deserialize(value).ok())
            .collect()
    }
}

/// A product from the shipment API's catalog.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Product {
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub id: Option<ResourceId>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub sku: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub image_url: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shipment(id: i64, updated_at: Option<Value>) -> Value {
        let mut value = json!({ "id": id, "status": "queued" });
        if let Some(ts) = updated_at {
            value["updated_at"] = ts;
        }
        value
    }

    fn list(data: Vec<Value>) -> ShipmentList {
        ShipmentList {
            data,
            extra: Map::new(),
        }
    }

    fn ids(list: &ShipmentList) -> Vec<i64> {
        list.data.iter().filter_map(|s| s["id"].as_i64()).collect()
    }

    #[test]
    fn test_sort_most_recent_first() {
        let mut list = list(vec![
            shipment(1, Some(json!("2024-03-01T10:00:00Z"))),
            shipment(2, Some(json!("2024-03-05T10:00:00Z"))),
            shipment(3, Some(json!("2024-03-03T10:00:00Z"))),
        ]);
        list.sort_by_updated_desc();
        assert_eq!(ids(&list), [2, 3, 1]);
    }

    #[test]
    fn test_sort_compares_instants_not_strings() {
        // 09:00-05:00 is 14:00Z, later than 12:00Z.
        let mut list = list(vec![
            shipment(1, Some(json!("2024-03-01T12:00:00Z"))),
            shipment(2, Some(json!("2024-03-01T09:00:00-05:00"))),
        ]);
        list.sort_by_updated_desc();
        assert_eq!(ids(&list), [2, 1]);
    }

    #[test]
    fn test_sort_puts_missing_timestamps_last_and_is_stable() {
        let mut list = list(vec![
            shipment(1, None),
            shipment(2, Some(json!("2024-03-01 08:00:00"))),
            shipment(3, Some(json!("not a date"))),
            shipment(4, Some(json!("2024-03-01T08:00:00Z"))),
        ]);
        list.sort_by_updated_desc();
        assert_eq!(ids(&list), [2, 4, 1, 3]);
    }

    #[test]
    fn test_sort_mixes_epoch_numbers_and_strings() {
        // 1767600000 is 2026-01-05T08:00:00Z.
        let mut list = list(vec![
            shipment(1, Some(json!("2026-01-04T08:00:00Z"))),
            shipment(2, Some(json!(1_767_600_000))),
            shipment(3, Some(json!(null))),
            shipment(4, Some(json!("2026-01-06 08:00:00"))),
        ]);
        list.sort_by_updated_desc();
        assert_eq!(ids(&list), [4, 2, 1, 3]);
    }

    #[test]
    fn test_list_serializes_back_unchanged() {
        let raw = json!({
            "data": [{
                "id": "abc",
                "status": null,
                "warehouse": { "code": "EWR" },
                "address": { "zip": 10001 },
                "items": [{ "product_id": 9, "quantity": "2", "lot": "L1" }]
            }],
            "meta": { "page": 1 }
        });
        let list: ShipmentList = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&list).unwrap(), raw);
    }

    #[test]
    fn test_typed_view_tolerates_loose_shapes() {
        let list: ShipmentList = serde_json::from_value(json!({
            "data": [
                {
                    "id": 7,
                    "order_ref": 1001,
                    "status": null,
                    "address": { "city": "Newark", "zip": 7102 },
                    "items": [{ "product_id": "9", "quantity": "2" }, "junk"],
                    "updated_at": 1_767_600_000
                },
                "not a shipment",
                { "status": "HELD", "address": "n/a", "items": {} }
            ]
        }))
        .unwrap();

        let shipments = list.shipments();
        assert_eq!(shipments.len(), 2);

        let first = &shipments[0];
        assert_eq!(first.id, Some(ResourceId::Numeric(7)));
        assert_eq!(first.order_ref.as_deref(), Some("1001"));
        assert_eq!(first.status, "");
        assert_eq!(first.status(), ShipmentStatus::Unknown);
        assert_eq!(first.address.as_ref().unwrap().one_line(), "Newark, 7102");
        assert_eq!(first.items.len(), 1);
        assert_eq!(first.items[0].quantity, Some(2));
        assert_eq!(first.items[0].product_id, Some(ResourceId::from("9")));
        assert!(first.updated_at().is_some());

        let second = &shipments[1];
        assert_eq!(second.id, None);
        assert_eq!(second.status(), ShipmentStatus::Held);
        assert!(second.address.is_none());
        assert!(second.items.is_empty());
    }

    #[test]
    fn test_tracking_number_shapes() {
        let mut s = Shipment::default();
        assert_eq!(s.tracking_number(), None);

        s.tracking = Some(json!("1Z999"));
        assert_eq!(s.tracking_number().as_deref(), Some("1Z999"));

        s.tracking = Some(json!({ "carrier": "ups", "number": "1Z000" }));
        assert_eq!(s.tracking_number().as_deref(), Some("1Z000"));

        s.tracking = Some(json!({ "tracking_number": 940_011 }));
        assert_eq!(s.tracking_number().as_deref(), Some("940011"));

        s.tracking = Some(json!(""));
        assert_eq!(s.tracking_number(), None);
    }

    #[test]
    fn test_address_one_line() {
        let address = ShipmentAddress {
            name: Some("Ada Lovelace".to_string()),
            address1: Some("1 Main St".to_string()),
            city: Some("Springfield".to_string()),
            zip: Some(" ".to_string()),
            ..Default::default()
        };
        assert_eq!(address.one_line(), "Ada Lovelace, 1 Main St, Springfield");
    }
}
