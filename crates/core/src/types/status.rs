//! Shipment status and the widget's static status tables.
//!
//! Statuses come from the shipment API as lowercase strings, but agents and
//! older payloads use other casings, so every lookup here is case-insensitive.

use serde::{Deserialize, Serialize};

/// Badge color for statuses the widget does not recognize.
pub const DEFAULT_STATUS_COLOR: &str = "#6b7280";

/// Shipment lifecycle status in the shipment API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    /// Waiting to be picked. Editable.
    Queued,
    /// On hold. Editable.
    Held,
    /// Requested from the warehouse.
    Requested,
    /// Being picked or packed.
    Processing,
    /// Handed to the carrier.
    Shipped,
    /// Returned to the warehouse.
    Returned,
    /// Archived.
    Inactive,
    /// Anything else the API sends.
    Unknown,
}

impl ShipmentStatus {
    /// Parse a status string, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn parse(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "queued" => Self::Queued,
            "held" => Self::Held,
            "requested" => Self::Requested,
            "processing" => Self::Processing,
            "shipped" => Self::Shipped,
            "returned" => Self::Returned,
            "inactive" => Self::Inactive,
            _ => Self::Unknown,
        }
    }

    /// Badge color (CSS hex) for this status.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Queued => "#2563eb",
            Self::Held => "#d97706",
            Self::Requested => "#7c3aed",
            Self::Processing => "#0891b2",
            Self::Shipped => "#16a34a",
            Self::Returned => "#dc2626",
            Self::Inactive | Self::Unknown => DEFAULT_STATUS_COLOR,
        }
    }

    /// Whether the widget offers the archive action.
    ///
    /// Only already-archived shipments are excluded. The proxy does not
    /// enforce this; it is a presentation rule.
    #[must_use]
    pub const fn can_archive(self) -> bool {
        !matches!(self, Self::Inactive)
    }

    /// Whether the widget offers hold/release.
    #[must_use]
    pub const fn can_edit(self) -> bool {
        matches!(self, Self::Queued | Self::Held)
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Queued => "Queued",
            Self::Held => "Held",
            Self::Requested => "Requested",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Returned => "Returned",
            Self::Inactive => "Inactive",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Badge color for a raw status string.
#[must_use]
pub fn status_color(status: &str) -> &'static str {
    ShipmentStatus::parse(status).color()
}

/// Whether a shipment in the raw status may be archived from the widget.
#[must_use]
pub fn can_archive(status: &str) -> bool {
    ShipmentStatus::parse(status).can_archive()
}

/// Whether a shipment in the raw status may be held or released from the widget.
#[must_use]
pub fn can_edit(status: &str) -> bool {
    ShipmentStatus::parse(status).can_edit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_is_case_insensitive() {
        assert_eq!(status_color("QUEUED"), status_color("queued"));
        assert_eq!(status_color(" Shipped "), "#16a34a");
    }

    #[test]
    fn test_unknown_status_is_default_gray() {
        assert_eq!(status_color("teleported"), DEFAULT_STATUS_COLOR);
        assert_eq!(status_color(""), DEFAULT_STATUS_COLOR);
        assert_eq!(ShipmentStatus::parse("teleported"), ShipmentStatus::Unknown);
    }

    #[test]
    fn test_can_archive_false_only_for_inactive() {
        assert!(!can_archive("inactive"));
        assert!(!can_archive("INACTIVE"));
        for status in [
            "queued",
            "held",
            "requested",
            "processing",
            "shipped",
            "returned",
            "mystery",
        ] {
            assert!(can_archive(status), "{status} should be archivable");
        }
    }

    #[test]
    fn test_can_edit_only_queued_and_held() {
        assert!(can_edit("queued"));
        assert!(can_edit("Held"));
        for status in ["requested", "processing", "shipped", "returned", "inactive", "x"] {
            assert!(!can_edit(status), "{status} should not be editable");
        }
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&ShipmentStatus::Processing).unwrap_or_default();
        assert_eq!(json, "\"processing\"");
    }
}
