//! Unified error handling for the proxy endpoints.
//!
//! Error bodies are JSON: `{"error": <message>, "detail": <detail or null>}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::shipments::ShipmentApiError;

/// Application-level error type for the proxy.
#[derive(Debug, Error)]
pub enum AppError {
    /// Shipment API operation failed.
    #[error("Shipment API error: {0}")]
    Shipments(#[from] ShipmentApiError),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub detail: Option<String>,
}

impl AppError {
    /// HTTP status this error is reported with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        let Self::Shipments(err) = self;
        match err {
            ShipmentApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ShipmentApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ShipmentApiError::Api { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ShipmentApiError::Http(_)
            | ShipmentApiError::AuthenticationFailed { .. }
            | ShipmentApiError::Protocol { .. }
            | ShipmentApiError::Url(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body sent to the client.
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        let Self::Shipments(err) = self;
        let (error, detail) = match err {
            ShipmentApiError::InvalidInput(msg) => ("Invalid input".to_string(), Some(msg.clone())),
            ShipmentApiError::NotFound(msg) => (msg.clone(), None),
            ShipmentApiError::Api { detail, .. } => (detail.clone(), None),
            ShipmentApiError::AuthenticationFailed { status, body } => (
                "Shipment API authentication failed".to_string(),
                Some(format!("HTTP {status}: {body}")),
            ),
            ShipmentApiError::Protocol { raw, .. } => {
                ("Invalid response from shipment API".to_string(), Some(raw.clone()))
            }
            ShipmentApiError::Http(e) => {
                ("Shipment API request failed".to_string(), Some(e.to_string()))
            }
            // Don't expose internal error details to clients
            ShipmentApiError::Url(_) => ("Internal server error".to_string(), None),
        };
        ErrorBody { error, detail }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                status = status.as_u16(),
                sentry_event_id = %event_id,
                "Proxy request error"
            );
        }

        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::from(ShipmentApiError::NotFound("No shipments found".to_string()));
        assert_eq!(err.to_string(), "Shipment API error: Not found: No shipments found");
    }

    #[test]
    fn test_shipment_errors_map_to_status_codes() {
        assert_eq!(
            get_status(ShipmentApiError::InvalidInput("order_ref is required".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(ShipmentApiError::NotFound("No shipments found".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(ShipmentApiError::AuthenticationFailed {
                status: 401,
                body: "bad credentials".to_string(),
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(ShipmentApiError::Protocol {
                status: 200,
                raw: "<html>".to_string(),
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_api_status_passthrough() {
        assert_eq!(
            get_status(ShipmentApiError::Api {
                status: 422,
                detail: "Failed to fetch shipments".to_string(),
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(ShipmentApiError::Api {
                status: 503,
                detail: "Failed to fetch shipments".to_string(),
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
        // Non-error upstream statuses can't be relayed as failures.
        assert_eq!(
            get_status(ShipmentApiError::Api {
                status: 302,
                detail: "Failed to fetch shipments".to_string(),
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_protocol_error_body_carries_raw_text() {
        let err = AppError::from(ShipmentApiError::Protocol {
            status: 200,
            raw: "not json at all".to_string(),
        });
        let body = err.body();
        assert_eq!(body.detail.as_deref(), Some("not json at all"));
    }

    #[test]
    fn test_url_error_details_hidden() {
        let body = AppError::from(ShipmentApiError::Url(url::ParseError::EmptyHost)).body();
        assert_eq!(body.error, "Internal server error");
        assert!(body.detail.is_none());
    }
}
