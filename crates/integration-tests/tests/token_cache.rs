//! Bearer token reuse and refresh against a fake shipment API.

use chrono::{Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use shipdesk_integration_tests::{FakeShipmentApi, ShipmentFixture, count, proxy_config};
use shipdesk_proxy::shipments::{CachedToken, ShipmentApiError, ShipmentClient};

fn fixture() -> ShipmentFixture {
    ShipmentFixture {
        shipments: vec![json!({ "id": 1, "order_ref": "#1001", "status": "queued" })],
        ..ShipmentFixture::default()
    }
}

#[tokio::test]
async fn test_token_reused_within_lifetime() {
    let api = FakeShipmentApi::start(fixture()).await;
    let config = proxy_config(&api, None);
    let client = ShipmentClient::new(&config.shipment_api).expect("client");

    let first = client.tokens().get_token().await.expect("first token");
    let second = client.tokens().get_token().await.expect("second token");

    assert_eq!(first.expose_secret(), second.expose_secret());
    assert_eq!(count(&api.calls.logins), 1);

    let cached = client.tokens().cached().await.expect("token cached");
    let remaining = cached.expires_at() - Utc::now();
    assert!(remaining > Duration::minutes(49) && remaining <= Duration::minutes(50));
}

#[tokio::test]
async fn test_expired_token_triggers_exactly_one_login() {
    let api = FakeShipmentApi::start(fixture()).await;
    let config = proxy_config(&api, None);
    let client = ShipmentClient::new(&config.shipment_api).expect("client");

    client.search_by_order_ref("#1001").await.expect("search");
    client.search_by_order_ref("#1001").await.expect("search");
    assert_eq!(count(&api.calls.logins), 1);

    // Issued 51 minutes ago: past the reuse window.
    let stale = CachedToken::issued_at(
        SecretString::from("token-1"),
        Utc::now() - Duration::minutes(51),
    );
    client.tokens().set_token(stale).await;

    client.search_by_order_ref("#1001").await.expect("search");
    client.search_by_order_ref("#1001").await.expect("search");
    assert_eq!(count(&api.calls.logins), 2);

    let token = client.tokens().get_token().await.expect("token");
    assert_eq!(token.expose_secret(), "token-2");
}

#[tokio::test]
async fn test_rejected_login_surfaces_upstream_status() {
    let api = FakeShipmentApi::start(ShipmentFixture {
        reject_login: Some(401),
        ..fixture()
    })
    .await;
    let config = proxy_config(&api, None);
    let client = ShipmentClient::new(&config.shipment_api).expect("client");

    let err = client.search_by_order_ref("#1001").await.unwrap_err();
    match err {
        ShipmentApiError::AuthenticationFailed { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid credentials");
        }
        other => panic!("expected authentication failure, got {other:?}"),
    }
    assert_eq!(count(&api.calls.searches), 0);
    assert!(client.tokens().cached().await.is_none());
}
