//! Integration tests for Shipment Desk.
//!
//! The proxy router is served on an ephemeral port and pointed at in-process
//! fake upstreams built with axum. The fakes count every call so tests can
//! assert exactly what reached the shipment API and Shopify.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shipdesk-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
};
use serde_json::{Value, json};

use shipdesk_proxy::config::ProxyConfig;
use shipdesk_proxy::state::AppState;

/// Shopify token that passes the entropy check.
pub const SHOPIFY_TEST_TOKEN: &str = "shpat_9fK2mQ7xLp4Rz8Vb3Nc6Wd1Yh5Tj0Gs";

/// Serve a router on `127.0.0.1` with an ephemeral port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Test server error");
    });
    format!("http://{addr}")
}

// ============================================================================
// Fake shipment API
// ============================================================================

/// What the fake shipment API answers with.
#[derive(Debug, Clone)]
pub struct ShipmentFixture {
    /// Shipments returned by search, in upstream order.
    pub shipments: Vec<Value>,
    /// Status for hold/release/archive.
    pub action_status: u16,
    /// Raw body for hold/release/archive.
    pub action_body: String,
    /// Products by ID.
    pub products: HashMap<String, Value>,
    /// Reject logins with this status.
    pub reject_login: Option<u16>,
    /// Fail every search with this status.
    pub search_status: Option<u16>,
}

impl Default for ShipmentFixture {
    fn default() -> Self {
        Self {
            shipments: Vec::new(),
            action_status: 200,
            action_body: r#"{"data":{"ok":true}}"#.to_string(),
            products: HashMap::new(),
            reject_login: None,
            search_status: None,
        }
    }
}

/// Call counters for the fake shipment API.
#[derive(Debug, Default)]
pub struct ShipmentCalls {
    pub logins: AtomicUsize,
    pub searches: AtomicUsize,
    pub lookups: AtomicUsize,
    pub actions: AtomicUsize,
    pub products: AtomicUsize,
    pub unauthorized: AtomicUsize,
    /// `order_ref` values received by search.
    pub search_refs: Mutex<Vec<String>>,
    /// `(method, id, action)` for every action.
    pub action_log: Mutex<Vec<(String, String, String)>>,
}

impl ShipmentCalls {
    /// Total requests received, logins included.
    pub fn total(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
            + self.searches.load(Ordering::SeqCst)
            + self.lookups.load(Ordering::SeqCst)
            + self.actions.load(Ordering::SeqCst)
            + self.products.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct ShipmentApiState {
    fixture: Arc<ShipmentFixture>,
    calls: Arc<ShipmentCalls>,
}

/// A running fake shipment API.
pub struct FakeShipmentApi {
    /// Base URL, including the `/v1` prefix.
    pub base_url: String,
    pub calls: Arc<ShipmentCalls>,
}

impl FakeShipmentApi {
    /// Start a fake shipment API answering from `fixture`.
    pub async fn start(fixture: ShipmentFixture) -> Self {
        let calls = Arc::new(ShipmentCalls::default());
        let state = ShipmentApiState {
            fixture: Arc::new(fixture),
            calls: Arc::clone(&calls),
        };

        let router = Router::new()
            .route("/v1/auth/login", post(fake_login))
            .route("/v1/shipments", get(fake_search))
            .route("/v1/shipments/{id}", get(fake_lookup))
            .route("/v1/shipments/{id}/hold", put(fake_action))
            .route("/v1/shipments/{id}/release", put(fake_action))
            .route("/v1/shipments/{id}/archive", patch(fake_action))
            .route("/v1/products/{id}", get(fake_product))
            .with_state(state);

        Self {
            base_url: format!("{}/v1", serve(router).await),
            calls,
        }
    }
}

async fn fake_login(State(state): State<ShipmentApiState>, Json(body): Json<Value>) -> Response {
    let n = state.calls.logins.fetch_add(1, Ordering::SeqCst) + 1;
    if let Some(status) = state.fixture.reject_login {
        let status = StatusCode::from_u16(status).unwrap();
        return (status, "invalid credentials").into_response();
    }
    assert!(body.get("email").is_some() && body.get("password").is_some());
    Json(json!({ "access_token": format!("token-{n}"), "expires_in": 3600 })).into_response()
}

fn authorized(state: &ShipmentApiState, headers: &HeaderMap) -> bool {
    let ok = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer token-"));
    if !ok {
        state.calls.unauthorized.fetch_add(1, Ordering::SeqCst);
    }
    ok
}

async fn fake_search(
    State(state): State<ShipmentApiState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.calls.searches.fetch_add(1, Ordering::SeqCst);
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let order_ref = query.get("order_ref").cloned().unwrap_or_default();
    state.calls.search_refs.lock().unwrap().push(order_ref.clone());
    if let Some(status) = state.fixture.search_status {
        let status = StatusCode::from_u16(status).unwrap();
        return (status, Json(json!({ "message": "search unavailable" }))).into_response();
    }

    let data: Vec<&Value> = state
        .fixture
        .shipments
        .iter()
        .filter(|s| s["order_ref"].as_str() == Some(order_ref.as_str()))
        .collect();
    if data.is_empty() {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "no shipments" }))).into_response();
    }
    Json(json!({ "data": data, "meta": { "page": 1 } })).into_response()
}

async fn fake_lookup(
    State(state): State<ShipmentApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    state.calls.lookups.fetch_add(1, Ordering::SeqCst);
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    state
        .fixture
        .shipments
        .iter()
        .find(|s| id_of(s) == id)
        .map_or_else(
            || StatusCode::NOT_FOUND.into_response(),
            |s| Json(json!({ "data": s })).into_response(),
        )
}

async fn fake_action(
    State(state): State<ShipmentApiState>,
    method: axum::http::Method,
    uri: axum::http::Uri,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    state.calls.actions.fetch_add(1, Ordering::SeqCst);
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let action = uri.path().rsplit('/').next().unwrap_or_default().to_string();
    state
        .calls
        .action_log
        .lock()
        .unwrap()
        .push((method.to_string(), id, action));

    let status = StatusCode::from_u16(state.fixture.action_status).unwrap();
    (status, state.fixture.action_body.clone()).into_response()
}

async fn fake_product(
    State(state): State<ShipmentApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    state.calls.products.fetch_add(1, Ordering::SeqCst);
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    state.fixture.products.get(&id).map_or_else(
        || StatusCode::NOT_FOUND.into_response(),
        |p| Json(json!({ "data": p })).into_response(),
    )
}

fn id_of(shipment: &Value) -> String {
    match &shipment["id"] {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// Fake Shopify Admin API
// ============================================================================

/// What the fake Shopify Admin API answers with.
#[derive(Debug, Clone, Default)]
pub struct ShopifyFixture {
    /// Order nodes returned by every orders query (Shopify's search is fuzzy).
    pub orders: Vec<Value>,
    /// Fulfillment order IDs whose cancellation is rejected with a user error.
    pub rejected: Vec<String>,
}

/// Call counters for the fake Shopify Admin API.
#[derive(Debug, Default)]
pub struct ShopifyCalls {
    pub order_queries: AtomicUsize,
    pub cancellations: AtomicUsize,
    /// `query` variables received by the orders query.
    pub order_searches: Mutex<Vec<String>>,
    /// Fulfillment order IDs a cancellation was requested for.
    pub cancelled_ids: Mutex<Vec<String>>,
}

impl ShopifyCalls {
    /// Total GraphQL requests received.
    pub fn total(&self) -> usize {
        self.order_queries.load(Ordering::SeqCst) + self.cancellations.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct ShopifyState {
    fixture: Arc<ShopifyFixture>,
    calls: Arc<ShopifyCalls>,
}

/// A running fake Shopify Admin API.
pub struct FakeShopify {
    /// Origin to use as `SHOPIFY_ADMIN_URL`.
    pub admin_url: String,
    pub calls: Arc<ShopifyCalls>,
}

impl FakeShopify {
    /// Start a fake Admin API answering from `fixture`.
    pub async fn start(fixture: ShopifyFixture) -> Self {
        let calls = Arc::new(ShopifyCalls::default());
        let state = ShopifyState {
            fixture: Arc::new(fixture),
            calls: Arc::clone(&calls),
        };
        let router = Router::new()
            .route("/admin/api/{version}/graphql.json", post(fake_graphql))
            .with_state(state);

        Self {
            admin_url: serve(router).await,
            calls,
        }
    }
}

async fn fake_graphql(
    State(state): State<ShopifyState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let token = headers
        .get("X-Shopify-Access-Token")
        .and_then(|v| v.to_str().ok());
    if token != Some(SHOPIFY_TEST_TOKEN) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let query = body["query"].as_str().unwrap_or_default();
    let variables = &body["variables"];

    if query.contains("fulfillmentOrderSubmitCancellationRequest") {
        state.calls.cancellations.fetch_add(1, Ordering::SeqCst);
        let id = variables["id"].as_str().unwrap_or_default().to_string();
        state.calls.cancelled_ids.lock().unwrap().push(id.clone());

        let user_errors = if state.fixture.rejected.contains(&id) {
            json!([{ "field": ["id"], "message": "Fulfillment order is not cancellable" }])
        } else {
            json!([])
        };
        return Json(json!({
            "data": {
                "fulfillmentOrderSubmitCancellationRequest": {
                    "fulfillmentOrder": { "id": id, "status": "IN_PROGRESS", "requestStatus": "CANCELLATION_REQUESTED" },
                    "userErrors": user_errors
                }
            }
        }))
        .into_response();
    }

    state.calls.order_queries.fetch_add(1, Ordering::SeqCst);
    let search = variables["query"].as_str().unwrap_or_default().to_string();
    state.calls.order_searches.lock().unwrap().push(search);
    Json(json!({ "data": { "orders": { "nodes": state.fixture.orders } } })).into_response()
}

/// An order node with the given fulfillment orders `(id, status, requestStatus)`.
pub fn order_node(id: u64, name: &str, fulfillment_orders: &[(&str, &str, &str)]) -> Value {
    let nodes: Vec<Value> = fulfillment_orders
        .iter()
        .map(|(fo_id, status, request_status)| {
            json!({ "id": fo_id, "status": status, "requestStatus": request_status })
        })
        .collect();
    json!({
        "id": format!("gid://shopify/Order/{id}"),
        "name": name,
        "fulfillmentOrders": { "nodes": nodes }
    })
}

// ============================================================================
// Proxy
// ============================================================================

/// Build proxy configuration pointing at the fakes.
pub fn proxy_config(shipments: &FakeShipmentApi, shopify: Option<&FakeShopify>) -> ProxyConfig {
    let mut vars: HashMap<&str, String> = HashMap::from([
        ("HOST", "127.0.0.1".to_string()),
        ("PORT", "0".to_string()),
        ("SHIPMENT_API_BASE_URL", shipments.base_url.clone()),
        ("SHIPMENT_API_EMAIL", "ops@shop.test".to_string()),
        ("SHIPMENT_API_PASSWORD", "correct-horse-battery".to_string()),
    ]);
    if let Some(shopify) = shopify {
        vars.insert("SHOPIFY_STORE", "shipdesk-test.myshopify.com".to_string());
        vars.insert("SHOPIFY_ACCESS_TOKEN", SHOPIFY_TEST_TOKEN.to_string());
        vars.insert("SHOPIFY_ADMIN_URL", shopify.admin_url.clone());
    }
    ProxyConfig::from_source(|key| vars.get(key).cloned()).expect("Invalid test configuration")
}

/// Start the proxy against the fakes and return its base URL.
pub async fn start_proxy(shipments: &FakeShipmentApi, shopify: Option<&FakeShopify>) -> String {
    let state = AppState::new(proxy_config(shipments, shopify)).expect("Failed to build state");
    serve(shipdesk_proxy::app(state)).await
}

/// Read a counter.
pub fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}
