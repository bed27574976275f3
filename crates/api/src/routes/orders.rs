//! Order creation, status changes and reads.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use common::{ChatId, OrderId};
use domain::{Actor, CheckoutRequest, CheckoutService, TransitionService};
use notify::{Messenger, NotificationSynchronizer};
use serde::{Deserialize, Serialize};
use store::{GeoPoint, Order, OrderStatus, OrderStore, PaymentMethod, ServiceMode};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S, M> {
    pub checkout: CheckoutService<S>,
    pub transitions: TransitionService<S>,
    pub notifier: NotificationSynchronizer<S, M>,
    pub store: S,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: i64,
    pub name: String,
    pub phone: String,
    pub service_mode: ServiceMode,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub items: Vec<OrderLineRequest>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Deserialize)]
pub struct OrderLineRequest {
    pub product: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    pub actor: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub number: i64,
    pub status: OrderStatus,
    pub service_mode: ServiceMode,
    pub payment_method: PaymentMethod,
    pub customer_id: i64,
    pub customer_name: String,
    pub customer_phone: String,
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub total: i64,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub items: Vec<OrderItemResponse>,
    pub created_at: String,
    pub confirmed_at: Option<String>,
    pub ready_at: Option<String>,
    pub delivered_at: Option<String>,
    pub picked_up_at: Option<String>,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: i64,
    pub line_total: i64,
}

#[derive(Serialize)]
pub struct HistoryEntryResponse {
    pub old_status: Option<OrderStatus>,
    pub new_status: OrderStatus,
    pub actor: Option<String>,
    pub note: String,
    pub changed_at: String,
}

#[derive(Serialize)]
pub struct OrderDetailResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub history: Vec<HistoryEntryResponse>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        fn rfc3339(ts: DateTime<Utc>) -> String {
            ts.to_rfc3339()
        }

        Self {
            id: order.id.to_string(),
            number: order.number,
            status: order.status,
            service_mode: order.service_mode,
            payment_method: order.payment_method,
            customer_id: order.customer_chat.as_i64(),
            customer_name: order.customer_name.clone(),
            customer_phone: order.customer_phone.clone(),
            subtotal: order.subtotal.amount(),
            delivery_fee: order.delivery_fee.amount(),
            total: order.total.amount(),
            address: order.address.clone(),
            latitude: order.location.map(|p| p.latitude),
            longitude: order.location.map(|p| p.longitude),
            items: order
                .items
                .iter()
                .map(|item| OrderItemResponse {
                    product_name: item.product_name.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price.amount(),
                    line_total: item.line_total.amount(),
                })
                .collect(),
            created_at: rfc3339(order.created_at),
            confirmed_at: order.confirmed_at.map(rfc3339),
            ready_at: order.ready_at.map(rfc3339),
            delivered_at: order.delivered_at.map(rfc3339),
            picked_up_at: order.picked_up_at.map(rfc3339),
        }
    }
}

// -- Handlers --

/// POST /orders — run the checkout gates and create an order.
#[tracing::instrument(skip(state, req))]
pub async fn create<S, M>(
    State(state): State<Arc<AppState<S, M>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(axum::http::StatusCode, Json<OrderResponse>), ApiError>
where
    S: OrderStore + Send + Sync + 'static,
    M: Messenger + Send + Sync + 'static,
{
    let location = match (req.latitude, req.longitude) {
        (Some(latitude), Some(longitude)) => Some(GeoPoint {
            latitude,
            longitude,
        }),
        (None, None) => None,
        _ => {
            return Err(ApiError::BadRequest(
                "latitude and longitude must be given together".to_string(),
            ));
        }
    };

    let order = state
        .checkout
        .place_order(
            CheckoutRequest {
                customer_chat: ChatId::new(req.customer_id),
                customer_name: req.name,
                customer_phone: req.phone,
                service_mode: req.service_mode,
                payment_method: req.payment_method,
                lines: req
                    .items
                    .into_iter()
                    .map(|line| (line.product, line.quantity))
                    .collect(),
                address: req.address,
                location,
                note: "placed via operator request".to_string(),
            },
            Utc::now(),
        )
        .await?;

    // Fire-and-forget relative to the committed creation: channel failures
    // are logged inside the synchronizer and never fail this response.
    state.notifier.notify_new(&order).await;

    Ok((axum::http::StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// POST /orders/{id}/status — request a status transition.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S, M>(
    State(state): State<Arc<AppState<S, M>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: OrderStore + Send + Sync + 'static,
    M: Messenger + Send + Sync + 'static,
{
    let order_id = parse_order_id(&id)?;
    let actor = match req.actor {
        Some(name) => Actor::Staff(name),
        None => Actor::System,
    };

    let order = state.transitions.transition(order_id, req.status, actor).await?;
    state.notifier.notify_status_changed(&order).await;

    Ok(Json(OrderResponse::from(&order)))
}

/// GET /orders/{id} — load an order with its status history.
#[tracing::instrument(skip(state))]
pub async fn get<S, M>(
    State(state): State<Arc<AppState<S, M>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderDetailResponse>, ApiError>
where
    S: OrderStore + Send + Sync + 'static,
    M: Messenger + Send + Sync + 'static,
{
    let order_id = parse_order_id(&id)?;
    let order = state
        .store
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;

    let history = state
        .store
        .history(order_id)
        .await?
        .into_iter()
        .map(|entry| HistoryEntryResponse {
            old_status: entry.old_status,
            new_status: entry.new_status,
            actor: entry.actor,
            note: entry.note,
            changed_at: entry.changed_at.to_rfc3339(),
        })
        .collect();

    Ok(Json(OrderDetailResponse {
        order: OrderResponse::from(&order),
        history,
    }))
}

/// GET /customers/{chat_id}/orders — a customer's orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list_for_customer<S, M>(
    State(state): State<Arc<AppState<S, M>>>,
    Path(chat_id): Path<i64>,
) -> Result<Json<Vec<OrderResponse>>, ApiError>
where
    S: OrderStore + Send + Sync + 'static,
    M: Messenger + Send + Sync + 'static,
{
    let orders = state
        .store
        .orders_for_customer(ChatId::new(chat_id))
        .await?;
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}
