//! Shipment Desk proxy library.
//!
//! This crate provides the proxy as a library, so the integration tests can
//! serve the same router the binary does.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod shipments;
pub mod shopify;
pub mod state;

use axum::Router;

use state::AppState;

/// Build the application router with CORS and request tracing.
///
/// Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let cors = middleware::cors_layer(&state.config().cors_allowed_origins);

    routes::routes()
        .layer(cors)
        .layer(middleware::trace_layer())
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode, header};
    use tower::ServiceExt;

    use crate::config::ProxyConfig;

    /// State pointing at an address nothing listens on.
    fn offline_state() -> AppState {
        offline_state_with_origins(None)
    }

    fn offline_state_with_origins(origins: Option<&str>) -> AppState {
        let config = ProxyConfig::from_source(|key| match key {
            "SHIPMENT_API_BASE_URL" => Some("http://127.0.0.1:9/v1".to_string()),
            "SHIPMENT_API_EMAIL" => Some("ops@shop.test".to_string()),
            "SHIPMENT_API_PASSWORD" => Some("pw".to_string()),
            "CORS_ALLOWED_ORIGINS" => origins.map(String::from),
            _ => None,
        })
        .unwrap();
        AppState::new(config).unwrap()
    }

    /// Send a CORS preflight for `GET /shipment` and return the allowed origin, if any.
    async fn preflight(state: AppState, origin: &str) -> Option<String> {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/shipment?order_ref=%231001")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();
        let response = app(state).oneshot(request).await.unwrap();
        assert!(response.status().is_success(), "preflight status {}", response.status());
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|value| value.to_str().unwrap().to_string())
    }

    async fn get(uri: &str) -> (StatusCode, String) {
        let response = app(offline_state())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        assert_eq!(get("/health").await, (StatusCode::OK, "ok".to_string()));
    }

    #[tokio::test]
    async fn test_ping_does_not_need_upstream() {
        let (status, body) = get("/shipment/ping").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"status":"awake"}"#);
    }

    #[tokio::test]
    async fn test_blank_order_ref_is_bad_request() {
        for uri in ["/shipment", "/shipment?order_ref=", "/shipment?order_ref=%20%20"] {
            let (status, body) = get(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            let json: serde_json::Value = serde_json::from_str(&body).unwrap();
            assert_eq!(json["error"], "Invalid input");
        }
    }

    #[tokio::test]
    async fn test_non_numeric_product_is_bad_request() {
        let (status, _) = get("/product/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_blank_widget_renders_search_box() {
        let (status, body) = get("/widget").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains(r#"name="order_ref""#));
    }

    #[tokio::test]
    async fn test_preflight_allows_any_origin_by_default() {
        let allowed = preflight(offline_state(), "https://desk.example.com").await;
        assert_eq!(allowed.as_deref(), Some("*"));
    }

    #[tokio::test]
    async fn test_preflight_respects_configured_origins() {
        let origins = Some("https://desk.example.com, https://other.example.com");

        let allowed = preflight(offline_state_with_origins(origins), "https://desk.example.com").await;
        assert_eq!(allowed.as_deref(), Some("https://desk.example.com"));

        let denied = preflight(offline_state_with_origins(origins), "https://evil.example.com").await;
        assert_eq!(denied, None);
    }
}
