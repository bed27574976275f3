//! Domain error taxonomy.
//!
//! Every domain-rule violation is its own variant so calling surfaces can
//! pick an appropriate user-facing message by kind.

use chrono::NaiveTime;
use common::{Money, OrderId};
use store::{OrderStatus, ServiceMode, StoreError};
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The requested status is not reachable from the order's current
    /// status under its service mode. Also returned when a transition is
    /// re-requested after it already applied.
    #[error("Cannot change a {mode} order from {from} to {to}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
        mode: ServiceMode,
    },

    /// The order id did not resolve.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// A cart line no longer resolves against the catalog.
    #[error("Product is not available: {product}")]
    ProductUnavailable { product: String },

    /// Checkout attempted outside the service window.
    #[error("Orders are not accepted right now; service hours are {start} to {end}")]
    ServiceClosed { start: NaiveTime, end: NaiveTime },

    /// The delivery location is beyond the service radius.
    #[error("Delivery is not available at {distance_km:.1} km (service radius {max_radius_km:.1} km)")]
    DeliveryUnavailable {
        distance_km: f64,
        max_radius_km: f64,
    },

    /// The products subtotal is below the configured floor.
    #[error("Order subtotal {subtotal} is below the minimum of {minimum}; {shortfall} more needed")]
    BelowMinimumOrder {
        subtotal: Money,
        minimum: Money,
        shortfall: Money,
    },

    /// Checkout attempted with no cart lines.
    #[error("The cart is empty")]
    EmptyCart,

    /// A delivery checkout is missing the customer's location.
    #[error("A location is required for delivery orders")]
    MissingLocation,

    /// Address/location can only be captured once the cart is in delivery
    /// mode.
    #[error("Select delivery before sharing an address or location")]
    DeliveryModeRequired,

    /// An error occurred in the order store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
