//! Operator HTTP surface for the order coordination system.
//!
//! Exposes order creation, status changes and reads over the shared core,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::{CheckoutService, Settings, TransitionService};
use metrics_exporter_prometheus::PrometheusHandle;
use notify::{ChannelConfig, InMemoryMessenger, Messenger, NotificationSynchronizer};
use store::OrderStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, M>(state: Arc<AppState<S, M>>, metrics_handle: PrometheusHandle) -> Router
where
    S: OrderStore + Send + Sync + 'static,
    M: Messenger + Send + Sync + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<S, M>))
        .route("/orders/{id}", get(routes::orders::get::<S, M>))
        .route(
            "/orders/{id}/status",
            post(routes::orders::update_status::<S, M>),
        )
        .route(
            "/customers/{chat_id}/orders",
            get(routes::orders::list_for_customer::<S, M>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the shared core around a store and messenger.
pub fn create_state<S, M>(
    store: S,
    messenger: M,
    settings: Settings,
    channels: ChannelConfig,
) -> Arc<AppState<S, M>>
where
    S: OrderStore + Clone + Send + Sync + 'static,
    M: Messenger + Clone + Send + Sync + 'static,
{
    Arc::new(AppState {
        checkout: CheckoutService::new(store.clone(), settings),
        transitions: TransitionService::new(store.clone()),
        notifier: NotificationSynchronizer::new(store.clone(), messenger, channels),
        store,
    })
}

/// Creates the default application state from environment configuration,
/// with the in-memory messenger standing in for the platform client.
pub fn create_default_state<S>(store: S) -> Arc<AppState<S, InMemoryMessenger>>
where
    S: OrderStore + Clone + Send + Sync + 'static,
{
    create_state(
        store,
        InMemoryMessenger::new(),
        Settings::from_env(),
        ChannelConfig::from_env(),
    )
}
