use async_trait::async_trait;
use common::{ChatId, MessageId, OrderId, Version};

use crate::{
    Channel, Customer, NewOrder, Order, Product, Result, StatusHistoryEntry,
};

/// Core trait for order store implementations.
///
/// Every mutation of an order is a single atomic read-modify-write unit
/// keyed by order id, so concurrent writers from the two entry surfaces
/// resolve to exactly one winner. All implementations must be thread-safe
/// (`Send + Sync`).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Creates an order atomically.
    ///
    /// Upserts the customer (refreshing name/phone), allocates the next
    /// human-facing order number, writes the order row, its items and the
    /// initial history row. Either everything persists or nothing does.
    async fn create_order(&self, new_order: NewOrder) -> Result<Order>;

    /// Loads an order with its items. Returns `None` if the id is unknown.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Persists an order's mutable state (status + timestamps) together
    /// with a history row, guarded by `expected`.
    ///
    /// Fails with [`crate::StoreError::VersionConflict`] when the stored
    /// version differs from `expected` — a concurrent writer won the race.
    /// Returns the order at its new version.
    async fn update_order(
        &self,
        order: &Order,
        expected: Version,
        history: StatusHistoryEntry,
    ) -> Result<Order>;

    /// Records a channel's message handle on the order, set-once.
    ///
    /// If a handle is already present (a concurrent notifier got there
    /// first) the stored one wins and is returned; otherwise `handle` is
    /// persisted and returned. Atomic with respect to concurrent
    /// transitions on the same order.
    async fn record_message_handle(
        &self,
        id: OrderId,
        channel: Channel,
        handle: MessageId,
    ) -> Result<MessageId>;

    /// Returns the append-only status history of an order, oldest first.
    async fn history(&self, id: OrderId) -> Result<Vec<StatusHistoryEntry>>;

    /// Returns a customer's orders, most recent first.
    async fn orders_for_customer(&self, chat: ChatId) -> Result<Vec<Order>>;

    /// Looks up a customer by chat identity.
    async fn get_customer(&self, chat: ChatId) -> Result<Option<Customer>>;

    /// Returns the currently available products, for catalog snapshots.
    async fn available_products(&self) -> Result<Vec<Product>>;

    /// Inserts or replaces a product by name.
    async fn upsert_product(&self, product: Product) -> Result<()>;
}
