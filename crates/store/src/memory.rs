use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{ChatId, MessageId, OrderId, Version};
use tokio::sync::RwLock;

use crate::{
    Channel, Customer, NewOrder, Order, OrderItem, OrderStatus, OrderStore, Product, Result,
    StatusHistoryEntry, StoreError,
};

#[derive(Default)]
struct Inner {
    orders: HashMap<OrderId, Order>,
    history: Vec<StatusHistoryEntry>,
    customers: HashMap<ChatId, Customer>,
    products: BTreeMap<String, Product>,
    last_number: i64,
}

/// In-memory order store.
///
/// Used by the test suites and single-process runs without a database.
/// Every mutating method takes the write lock for its whole critical
/// section, which gives the same atomicity guarantees as the Postgres
/// implementation's transactions.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.inner.read().await.orders.len()
    }

    /// Returns the number of stored customers.
    pub async fn customer_count(&self) -> usize {
        self.inner.read().await.customers.len()
    }

    /// Clears all stored state.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.orders.clear();
        inner.history.clear();
        inner.customers.clear();
        inner.products.clear();
        inner.last_number = 0;
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create_order(&self, new_order: NewOrder) -> Result<Order> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();

        inner
            .customers
            .entry(new_order.customer_chat)
            .and_modify(|c| {
                c.full_name = new_order.customer_name.clone();
                c.phone_number = new_order.customer_phone.clone();
            })
            .or_insert_with(|| Customer {
                chat_id: new_order.customer_chat,
                full_name: new_order.customer_name.clone(),
                phone_number: new_order.customer_phone.clone(),
                created_at: now,
            });

        inner.last_number += 1;
        let order = Order {
            id: OrderId::new(),
            number: inner.last_number,
            version: Version::first(),
            customer_chat: new_order.customer_chat,
            customer_name: new_order.customer_name,
            customer_phone: new_order.customer_phone,
            status: OrderStatus::New,
            service_mode: new_order.service_mode,
            payment_method: new_order.payment_method,
            subtotal: new_order.subtotal,
            delivery_fee: new_order.delivery_fee,
            total: new_order.total,
            address: new_order.address,
            location: new_order.location,
            items: new_order
                .items
                .into_iter()
                .map(|i| OrderItem::new(i.product_name, i.quantity, i.unit_price))
                .collect(),
            customer_message: None,
            kitchen_message: None,
            courier_message: None,
            created_at: now,
            confirmed_at: None,
            ready_at: None,
            delivered_at: None,
            picked_up_at: None,
        };

        inner.history.push(StatusHistoryEntry {
            order_id: order.id,
            old_status: None,
            new_status: OrderStatus::New,
            actor: None,
            note: new_order.note,
            changed_at: now,
        });
        inner.orders.insert(order.id, order.clone());

        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.inner.read().await.orders.get(&id).cloned())
    }

    async fn update_order(
        &self,
        order: &Order,
        expected: Version,
        history: StatusHistoryEntry,
    ) -> Result<Order> {
        let mut inner = self.inner.write().await;

        let stored = inner
            .orders
            .get_mut(&order.id)
            .ok_or(StoreError::OrderNotFound(order.id))?;

        if stored.version != expected {
            return Err(StoreError::VersionConflict {
                order_id: order.id,
                expected,
                actual: stored.version,
            });
        }

        let mut updated = order.clone();
        updated.version = expected.next();
        // Message handles are owned by record_message_handle; keep whatever
        // is stored so a stale caller copy cannot clobber them.
        updated.customer_message = stored.customer_message;
        updated.kitchen_message = stored.kitchen_message;
        updated.courier_message = stored.courier_message;
        *stored = updated.clone();

        inner.history.push(history);

        Ok(updated)
    }

    async fn record_message_handle(
        &self,
        id: OrderId,
        channel: Channel,
        handle: MessageId,
    ) -> Result<MessageId> {
        let mut inner = self.inner.write().await;

        let stored = inner
            .orders
            .get_mut(&id)
            .ok_or(StoreError::OrderNotFound(id))?;

        let slot = match channel {
            Channel::Customer => &mut stored.customer_message,
            Channel::Kitchen => &mut stored.kitchen_message,
            Channel::Courier => &mut stored.courier_message,
        };

        Ok(*slot.get_or_insert(handle))
    }

    async fn history(&self, id: OrderId) -> Result<Vec<StatusHistoryEntry>> {
        let inner = self.inner.read().await;
        Ok(inner
            .history
            .iter()
            .filter(|h| h.order_id == id)
            .cloned()
            .collect())
    }

    async fn orders_for_customer(&self, chat: ChatId) -> Result<Vec<Order>> {
        let inner = self.inner.read().await;
        let mut orders: Vec<_> = inner
            .orders
            .values()
            .filter(|o| o.customer_chat == chat)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.number.cmp(&a.number)));
        Ok(orders)
    }

    async fn get_customer(&self, chat: ChatId) -> Result<Option<Customer>> {
        Ok(self.inner.read().await.customers.get(&chat).cloned())
    }

    async fn available_products(&self) -> Result<Vec<Product>> {
        let inner = self.inner.read().await;
        Ok(inner
            .products
            .values()
            .filter(|p| p.is_available)
            .cloned()
            .collect())
    }

    async fn upsert_product(&self, product: Product) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.products.insert(product.name.clone(), product);
        Ok(())
    }
}
