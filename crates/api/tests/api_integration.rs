//! Integration tests for the operator API.

use std::sync::OnceLock;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveTime;
use common::{ChatId, Money};
use domain::{Settings, pricing::ServiceWindow};
use metrics_exporter_prometheus::PrometheusHandle;
use notify::{ChannelConfig, InMemoryMessenger};
use store::{InMemoryOrderStore, OrderStore, Product};
use tower::ServiceExt;

const KITCHEN: ChatId = ChatId::new(-100);
const COURIER: ChatId = ChatId::new(-200);

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    app: Router,
    store: InMemoryOrderStore,
    messenger: InMemoryMessenger,
}

async fn setup() -> TestApp {
    let store = InMemoryOrderStore::new();
    store
        .upsert_product(Product::new("Plov", "Mains", Money::new(15_000)))
        .await
        .unwrap();
    store
        .upsert_product(Product::new("Tea", "Drinks", Money::new(3_000)))
        .await
        .unwrap();

    // Keep the tests independent of the wall clock.
    let settings = Settings {
        window: ServiceWindow::new(
            NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
            NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap(),
        ),
        ..Settings::default()
    };

    let messenger = InMemoryMessenger::new();
    let state = api::create_state(
        store.clone(),
        messenger.clone(),
        settings,
        ChannelConfig::new(KITCHEN, COURIER),
    );
    let app = api::create_app(state, get_metrics_handle());

    TestApp {
        app,
        store,
        messenger,
    }
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_string(&json).unwrap())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn delivery_order_body() -> serde_json::Value {
    serde_json::json!({
        "customer_id": 11,
        "name": "Aziza Karimova",
        "phone": "+998901234567",
        "service_mode": "delivery",
        "items": [
            { "product": "Plov", "quantity": 1 },
            { "product": "Tea", "quantity": 2 }
        ],
        "address": "12 Navoi street",
        // ~2.9 km north of the default venue.
        "latitude": 40.691316,
        "longitude": 72.563908
    })
}

#[tokio::test]
async fn test_health_check() {
    let t = setup().await;
    let (status, json) = send(&t.app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_create_delivery_order() {
    let t = setup().await;

    let (status, json) = send(&t.app, "POST", "/orders", Some(delivery_order_body())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["status"], "new");
    assert_eq!(json["number"], 1);
    assert_eq!(json["subtotal"], 21_000);
    assert_eq!(json["delivery_fee"], 15_000);
    assert_eq!(json["total"], 36_000);
    assert_eq!(json["items"].as_array().unwrap().len(), 2);

    // Creation fanned out to customer and kitchen.
    assert_eq!(t.messenger.messages_for(ChatId::new(11)).len(), 1);
    let kitchen = t.messenger.single_message_for(KITCHEN).unwrap();
    assert!(kitchen.text.contains("New order #1"));
    assert_eq!(t.messenger.locations_for(KITCHEN).len(), 1);
}

#[tokio::test]
async fn test_create_below_minimum_is_rejected() {
    let t = setup().await;
    let body = serde_json::json!({
        "customer_id": 11,
        "name": "Aziza Karimova",
        "phone": "+998901234567",
        "service_mode": "pickup",
        "items": [{ "product": "Tea", "quantity": 2 }]
    });

    let (status, json) = send(&t.app, "POST", "/orders", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["kind"], "below_minimum_order");
    assert_eq!(t.store.order_count().await, 0);
}

#[tokio::test]
async fn test_create_out_of_radius_is_rejected() {
    let t = setup().await;
    let mut body = delivery_order_body();
    // ~12 km away.
    body["latitude"] = serde_json::json!(40.773150);

    let (status, json) = send(&t.app, "POST", "/orders", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["kind"], "delivery_unavailable");
    assert_eq!(t.store.order_count().await, 0);
}

#[tokio::test]
async fn test_create_unknown_product_is_rejected() {
    let t = setup().await;
    let mut body = delivery_order_body();
    body["items"] = serde_json::json!([{ "product": "Retired Dish", "quantity": 1 }]);

    let (status, json) = send(&t.app, "POST", "/orders", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["kind"], "product_unavailable");
}

#[tokio::test]
async fn test_status_transition_and_idempotent_rejection() {
    let t = setup().await;
    let (_, created) = send(&t.app, "POST", "/orders", Some(delivery_order_body())).await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, json) = send(
        &t.app,
        "POST",
        &format!("/orders/{id}/status"),
        Some(serde_json::json!({ "status": "confirmed", "actor": "chef" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "confirmed");
    assert!(json["confirmed_at"].is_string());

    // Re-requesting the applied transition fails, it does not no-op.
    let (status, json) = send(
        &t.app,
        "POST",
        &format!("/orders/{id}/status"),
        Some(serde_json::json!({ "status": "confirmed" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["kind"], "invalid_transition");
}

#[tokio::test]
async fn test_illegal_jump_is_rejected() {
    let t = setup().await;
    let (_, created) = send(&t.app, "POST", "/orders", Some(delivery_order_body())).await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, json) = send(
        &t.app,
        "POST",
        &format!("/orders/{id}/status"),
        Some(serde_json::json!({ "status": "delivered" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["kind"], "invalid_transition");
}

#[tokio::test]
async fn test_get_order_includes_history() {
    let t = setup().await;
    let (_, created) = send(&t.app, "POST", "/orders", Some(delivery_order_body())).await;
    let id = created["id"].as_str().unwrap().to_string();

    send(
        &t.app,
        "POST",
        &format!("/orders/{id}/status"),
        Some(serde_json::json!({ "status": "confirmed", "actor": "chef" })),
    )
    .await;

    let (status, json) = send(&t.app, "GET", &format!("/orders/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "confirmed");

    let history = json["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0]["old_status"].is_null());
    assert_eq!(history[0]["new_status"], "new");
    assert_eq!(history[1]["new_status"], "confirmed");
    assert_eq!(history[1]["actor"], "chef");
}

#[tokio::test]
async fn test_get_unknown_order_is_not_found() {
    let t = setup().await;
    let (status, json) = send(
        &t.app,
        "GET",
        &format!("/orders/{}", uuid::Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["kind"], "not_found");
}

#[tokio::test]
async fn test_list_customer_orders() {
    let t = setup().await;
    send(&t.app, "POST", "/orders", Some(delivery_order_body())).await;
    send(&t.app, "POST", "/orders", Some(delivery_order_body())).await;

    let (status, json) = send(&t.app, "GET", "/customers/11/orders", None).await;
    assert_eq!(status, StatusCode::OK);
    let orders = json.as_array().unwrap();
    assert_eq!(orders.len(), 2);
    // Newest first.
    assert_eq!(orders[0]["number"], 2);

    let (_, empty) = send(&t.app, "GET", "/customers/999/orders", None).await;
    assert_eq!(empty.as_array().unwrap().len(), 0);
}
