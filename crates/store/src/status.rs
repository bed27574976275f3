//! Order status and service mode enums with the shared transition table.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// Transitions depend on the service mode:
/// ```text
/// pickup:   New ──► Confirmed ──► Ready ──► PickedUp
/// delivery: New ──► Confirmed ──► Ready ──► Enroute ──► Delivered
/// ```
/// `Cancelled` is reachable from every non-terminal state. `Delivered`,
/// `PickedUp` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Just placed, awaiting kitchen confirmation.
    #[default]
    New,

    /// Accepted by the kitchen.
    Confirmed,

    /// Prepared; waiting for the courier (delivery) or the customer (pickup).
    Ready,

    /// Courier is on the way (delivery only).
    Enroute,

    /// Handed over by the courier (terminal, delivery only).
    Delivered,

    /// Collected at the restaurant (terminal, pickup only).
    PickedUp,

    /// Cancelled by staff or courier (terminal).
    Cancelled,
}

impl OrderStatus {
    /// Returns the statuses this one may move to under the given mode.
    ///
    /// This table is the single source of truth for both entry surfaces;
    /// there are no self-loops, so re-requesting an applied transition is
    /// always rejected.
    pub fn allowed_next(&self, mode: ServiceMode) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match (self, mode) {
            (New, _) => &[Confirmed, Cancelled],
            (Confirmed, _) => &[Ready, Cancelled],
            (Ready, ServiceMode::Pickup) => &[PickedUp, Cancelled],
            (Ready, ServiceMode::Delivery) => &[Enroute, Cancelled],
            (Enroute, ServiceMode::Delivery) => &[Delivered, Cancelled],
            _ => &[],
        }
    }

    /// Returns true if `next` is a legal transition from this status.
    pub fn can_transition_to(&self, next: OrderStatus, mode: ServiceMode) -> bool {
        self.allowed_next(mode).contains(&next)
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::PickedUp | OrderStatus::Cancelled
        )
    }

    /// Returns the wire/storage name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Ready => "ready",
            OrderStatus::Enroute => "enroute",
            OrderStatus::Delivered => "delivered",
            OrderStatus::PickedUp => "picked_up",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Returns the human-readable status label shown in messages.
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::New => "New",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Ready => "Ready",
            OrderStatus::Enroute => "On the way",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::PickedUp => "Picked up",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Returns the status icon shown next to the label.
    pub fn icon(&self) -> &'static str {
        match self {
            OrderStatus::New => "🆕",
            OrderStatus::Confirmed => "✅",
            OrderStatus::Ready => "🍽",
            OrderStatus::Enroute => "🚚",
            OrderStatus::Delivered => "✅",
            OrderStatus::PickedUp => "✅",
            OrderStatus::Cancelled => "❌",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(OrderStatus::New),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "ready" => Ok(OrderStatus::Ready),
            "enroute" => Ok(OrderStatus::Enroute),
            "delivered" => Ok(OrderStatus::Delivered),
            "picked_up" => Ok(OrderStatus::PickedUp),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// How the order reaches the customer. Fixed per order at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServiceMode {
    /// Courier delivery to the customer's location.
    #[default]
    Delivery,

    /// Customer collects at the restaurant.
    Pickup,
}

impl ServiceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceMode::Delivery => "delivery",
            ServiceMode::Pickup => "pickup",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ServiceMode::Delivery => "Delivery",
            ServiceMode::Pickup => "Pickup",
        }
    }
}

impl std::fmt::Display for ServiceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ServiceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delivery" => Ok(ServiceMode::Delivery),
            "pickup" => Ok(ServiceMode::Pickup),
            other => Err(format!("unknown service mode: {other}")),
        }
    }
}

/// Payment method label recorded on the order. No processing happens here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash on handover.
    #[default]
    Cash,

    /// Card on handover.
    Card,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

/// One of the three independent message threads tracked per order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// The ordering customer's chat.
    Customer,

    /// The kitchen staff chat.
    Kitchen,

    /// The courier chat (used only for delivery orders).
    Courier,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Customer => "customer",
            Channel::Kitchen => "kitchen",
            Channel::Courier => "courier",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
