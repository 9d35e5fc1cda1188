//! Identifiers for resources owned by the shipment API.
//!
//! The shipment API is not consistent about whether IDs are JSON numbers or
//! strings. [`ResourceId`] accepts both and serializes back in the same shape,
//! so relayed payloads are not rewritten.

use serde::{Deserialize, Serialize};

/// A shipment, item, or product ID as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    /// Numeric ID (e.g., `12345`).
    Numeric(i64),
    /// String ID (e.g., `"12345"` or `"shp_9f2c"`).
    Text(String),
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for ResourceId {
    fn from(id: i64) -> Self {
        Self::Numeric(id)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_and_text_ids_keep_their_shape() {
        let numeric: ResourceId = serde_json::from_str("42").unwrap();
        let text: ResourceId = serde_json::from_str("\"42\"").unwrap();

        assert_eq!(numeric, ResourceId::Numeric(42));
        assert_eq!(text, ResourceId::Text("42".to_string()));
        assert_eq!(serde_json::to_string(&numeric).unwrap(), "42");
        assert_eq!(serde_json::to_string(&text).unwrap(), "\"42\"");
    }

    #[test]
    fn test_display() {
        assert_eq!(ResourceId::from(7).to_string(), "7");
        assert_eq!(ResourceId::from("abc").to_string(), "abc");
    }
}
