//! The order entity and its satellite records.

use chrono::{DateTime, Utc};
use common::{ChatId, MessageId, Money, OrderId, Version};
use serde::{Deserialize, Serialize};

use crate::status::{Channel, OrderStatus, PaymentMethod, ServiceMode};

/// A geographic coordinate shared by the customer for delivery.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// A line of an order: immutable snapshot of the product at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Product name as it read when the order was placed.
    pub product_name: String,

    /// Quantity ordered, always positive.
    pub quantity: u32,

    /// Unit price at order time.
    pub unit_price: Money,

    /// `quantity * unit_price`.
    pub line_total: Money,
}

impl OrderItem {
    pub fn new(product_name: impl Into<String>, quantity: u32, unit_price: Money) -> Self {
        Self {
            product_name: product_name.into(),
            quantity,
            unit_price,
            line_total: unit_price.multiply(quantity),
        }
    }
}

/// A persisted order.
///
/// Owned exclusively by the store; mutated only through guarded updates so
/// that status, timestamps and history never diverge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,

    /// Human-facing sequential order number, unique, assigned at creation.
    pub number: i64,

    /// Optimistic concurrency token, bumped on every committed mutation.
    pub version: Version,

    pub customer_chat: ChatId,
    pub customer_name: String,
    pub customer_phone: String,

    pub status: OrderStatus,
    pub service_mode: ServiceMode,
    pub payment_method: PaymentMethod,

    pub subtotal: Money,
    pub delivery_fee: Money,
    pub total: Money,

    /// Free-text address, delivery orders only.
    pub address: Option<String>,
    /// Shared coordinates, delivery orders only.
    pub location: Option<GeoPoint>,

    pub items: Vec<OrderItem>,

    pub customer_message: Option<MessageId>,
    pub kitchen_message: Option<MessageId>,
    pub courier_message: Option<MessageId>,

    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub ready_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub picked_up_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Returns the recorded message handle for a channel, if any.
    pub fn message_handle(&self, channel: Channel) -> Option<MessageId> {
        match channel {
            Channel::Customer => self.customer_message,
            Channel::Kitchen => self.kitchen_message,
            Channel::Courier => self.courier_message,
        }
    }

    /// Stamps the timestamp that belongs to `status`, if it has one.
    ///
    /// `Enroute` and `Cancelled` carry no dedicated timestamp. Each field is
    /// written at most once because no status is reachable twice.
    pub fn stamp(&mut self, status: OrderStatus, at: DateTime<Utc>) {
        match status {
            OrderStatus::Confirmed => self.confirmed_at = Some(at),
            OrderStatus::Ready => self.ready_at = Some(at),
            OrderStatus::Delivered => self.delivered_at = Some(at),
            OrderStatus::PickedUp => self.picked_up_at = Some(at),
            OrderStatus::New | OrderStatus::Enroute | OrderStatus::Cancelled => {}
        }
    }
}

/// Creation request handed to [`crate::OrderStore::create_order`].
///
/// The store turns this into a customer upsert, an order row with a fresh
/// number, its items, and the initial history row — all in one atomic unit.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_chat: ChatId,
    pub customer_name: String,
    pub customer_phone: String,

    pub service_mode: ServiceMode,
    pub payment_method: PaymentMethod,

    pub subtotal: Money,
    pub delivery_fee: Money,
    pub total: Money,

    pub address: Option<String>,
    pub location: Option<GeoPoint>,

    pub items: Vec<NewOrderItem>,

    /// History note describing where the order came from.
    pub note: String,
}

/// One line of a creation request.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl NewOrderItem {
    pub fn new(product_name: impl Into<String>, quantity: u32, unit_price: Money) -> Self {
        Self {
            product_name: product_name.into(),
            quantity,
            unit_price,
        }
    }
}

/// Append-only audit row written with every status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub order_id: OrderId,

    /// `None` for the creation row.
    pub old_status: Option<OrderStatus>,
    pub new_status: OrderStatus,

    /// `None` means the change was automated (channel callback / system).
    pub actor: Option<String>,

    pub note: String,
    pub changed_at: DateTime<Utc>,
}
