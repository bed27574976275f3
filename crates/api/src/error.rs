//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Domain rule rejection or domain-layer failure.
    Domain(DomainError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg)
            }
        };

        let body = serde_json::json!({ "kind": kind, "error": message });
        (status, axum::Json(body)).into_response()
    }
}

/// Every domain-rule rejection keeps its own `kind` so callers can choose
/// an appropriate user-facing message.
fn domain_error_to_response(err: DomainError) -> (StatusCode, &'static str, String) {
    let message = err.to_string();
    match &err {
        DomainError::InvalidTransition { .. } => {
            (StatusCode::CONFLICT, "invalid_transition", message)
        }
        DomainError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", message),
        DomainError::ProductUnavailable { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "product_unavailable",
            message,
        ),
        DomainError::ServiceClosed { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "service_closed", message)
        }
        DomainError::DeliveryUnavailable { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "delivery_unavailable",
            message,
        ),
        DomainError::BelowMinimumOrder { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "below_minimum_order",
            message,
        ),
        DomainError::EmptyCart => (StatusCode::BAD_REQUEST, "empty_cart", message),
        DomainError::MissingLocation => (StatusCode::BAD_REQUEST, "missing_location", message),
        DomainError::DeliveryModeRequired => {
            (StatusCode::BAD_REQUEST, "delivery_mode_required", message)
        }
        DomainError::Store(StoreError::VersionConflict { .. }) => {
            (StatusCode::CONFLICT, "conflict", message)
        }
        DomainError::Store(StoreError::OrderNotFound(_)) => {
            (StatusCode::NOT_FOUND, "not_found", message)
        }
        DomainError::Store(_) => {
            tracing::error!(error = %message, "store error");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Domain(DomainError::Store(err))
    }
}
