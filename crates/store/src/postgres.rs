use async_trait::async_trait;
use chrono::Utc;
use common::{ChatId, MessageId, Money, OrderId, Version};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Channel, Customer, GeoPoint, NewOrder, Order, OrderItem, OrderStatus, OrderStore,
    PaymentMethod, Product, Result, ServiceMode, StatusHistoryEntry, StoreError,
};

/// PostgreSQL-backed order store.
///
/// Every mutation runs inside a transaction; order updates carry a version
/// guard in the `WHERE` clause so concurrent writers resolve to exactly one
/// winner.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_order(row: &PgRow, items: Vec<OrderItem>) -> Result<Order> {
        let latitude: Option<f64> = row.try_get("latitude")?;
        let longitude: Option<f64> = row.try_get("longitude")?;
        let location = match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        };

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            number: row.try_get("number")?,
            version: Version::new(row.try_get("version")?),
            customer_chat: ChatId::new(row.try_get("customer_chat")?),
            customer_name: row.try_get("customer_name")?,
            customer_phone: row.try_get("customer_phone")?,
            status: parse_text::<OrderStatus>(row, "status")?,
            service_mode: parse_text::<ServiceMode>(row, "service_mode")?,
            payment_method: parse_text::<PaymentMethod>(row, "payment_method")?,
            subtotal: Money::new(row.try_get("subtotal")?),
            delivery_fee: Money::new(row.try_get("delivery_fee")?),
            total: Money::new(row.try_get("total")?),
            address: row.try_get("address")?,
            location,
            items,
            customer_message: row
                .try_get::<Option<i64>, _>("customer_message_id")?
                .map(MessageId::new),
            kitchen_message: row
                .try_get::<Option<i64>, _>("kitchen_message_id")?
                .map(MessageId::new),
            courier_message: row
                .try_get::<Option<i64>, _>("courier_message_id")?
                .map(MessageId::new),
            created_at: row.try_get("created_at")?,
            confirmed_at: row.try_get("confirmed_at")?,
            ready_at: row.try_get("ready_at")?,
            delivered_at: row.try_get("delivered_at")?,
            picked_up_at: row.try_get("picked_up_at")?,
        })
    }

    async fn items_for_order<'e, E>(executor: E, id: OrderId) -> Result<Vec<OrderItem>>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let rows = sqlx::query(
            r#"
            SELECT product_name, quantity, unit_price, line_total
            FROM order_items
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(executor)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(OrderItem {
                    product_name: row.try_get("product_name")?,
                    quantity: row.try_get::<i32, _>("quantity")? as u32,
                    unit_price: Money::new(row.try_get("unit_price")?),
                    line_total: Money::new(row.try_get("line_total")?),
                })
            })
            .collect()
    }

    async fn insert_history<'e, E>(executor: E, entry: &StatusHistoryEntry) -> Result<()>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query(
            r#"
            INSERT INTO status_history (order_id, old_status, new_status, actor, note, changed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.order_id.as_uuid())
        .bind(entry.old_status.map(|s| s.as_str()))
        .bind(entry.new_status.as_str())
        .bind(entry.actor.as_deref())
        .bind(&entry.note)
        .bind(entry.changed_at)
        .execute(executor)
        .await?;
        Ok(())
    }
}

fn parse_text<T>(row: &PgRow, column: &str) -> Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(StoreError::Corrupt)
}

fn handle_column(channel: Channel) -> &'static str {
    match channel {
        Channel::Customer => "customer_message_id",
        Channel::Kitchen => "kitchen_message_id",
        Channel::Courier => "courier_message_id",
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn create_order(&self, new_order: NewOrder) -> Result<Order> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();
        let id = OrderId::new();

        sqlx::query(
            r#"
            INSERT INTO customers (chat_id, full_name, phone_number, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (chat_id)
            DO UPDATE SET full_name = EXCLUDED.full_name, phone_number = EXCLUDED.phone_number
            "#,
        )
        .bind(new_order.customer_chat.as_i64())
        .bind(&new_order.customer_name)
        .bind(&new_order.customer_phone)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let number: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (
                id, version, customer_chat, customer_name, customer_phone,
                status, service_mode, payment_method,
                subtotal, delivery_fee, total,
                address, latitude, longitude, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING number
            "#,
        )
        .bind(id.as_uuid())
        .bind(Version::first().as_i64())
        .bind(new_order.customer_chat.as_i64())
        .bind(&new_order.customer_name)
        .bind(&new_order.customer_phone)
        .bind(OrderStatus::New.as_str())
        .bind(new_order.service_mode.as_str())
        .bind(new_order.payment_method.as_str())
        .bind(new_order.subtotal.amount())
        .bind(new_order.delivery_fee.amount())
        .bind(new_order.total.amount())
        .bind(new_order.address.as_deref())
        .bind(new_order.location.map(|p| p.latitude))
        .bind(new_order.location.map(|p| p.longitude))
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(new_order.items.len());
        for line in &new_order.items {
            let item = OrderItem::new(line.product_name.clone(), line.quantity, line.unit_price);
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_name, quantity, unit_price, line_total)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(id.as_uuid())
            .bind(&item.product_name)
            .bind(item.quantity as i32)
            .bind(item.unit_price.amount())
            .bind(item.line_total.amount())
            .execute(&mut *tx)
            .await?;
            items.push(item);
        }

        Self::insert_history(
            &mut *tx,
            &StatusHistoryEntry {
                order_id: id,
                old_status: None,
                new_status: OrderStatus::New,
                actor: None,
                note: new_order.note.clone(),
                changed_at: now,
            },
        )
        .await?;

        tx.commit().await?;

        Ok(Order {
            id,
            number,
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
            items,
            customer_message: None,
            kitchen_message: None,
            courier_message: None,
            created_at: now,
            confirmed_at: None,
            ready_at: None,
            delivered_at: None,
            picked_up_at: None,
        })
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let items = Self::items_for_order(&self.pool, id).await?;
                Ok(Some(Self::row_to_order(&row, items)?))
            }
            None => Ok(None),
        }
    }

    async fn update_order(
        &self,
        order: &Order,
        expected: Version,
        history: StatusHistoryEntry,
    ) -> Result<Order> {
        let mut tx = self.pool.begin().await?;
        let new_version = expected.next();

        let updated = sqlx::query(
            r#"
            UPDATE orders
            SET version = $3,
                status = $4,
                confirmed_at = $5,
                ready_at = $6,
                delivered_at = $7,
                picked_up_at = $8
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(expected.as_i64())
        .bind(new_version.as_i64())
        .bind(order.status.as_str())
        .bind(order.confirmed_at)
        .bind(order.ready_at)
        .bind(order.delivered_at)
        .bind(order.picked_up_at)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            // Either the order is gone or another writer committed first.
            let actual: Option<i64> =
                sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
                    .bind(order.id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await?;

            return match actual {
                Some(actual) => Err(StoreError::VersionConflict {
                    order_id: order.id,
                    expected,
                    actual: Version::new(actual),
                }),
                None => Err(StoreError::OrderNotFound(order.id)),
            };
        }

        Self::insert_history(&mut *tx, &history).await?;
        tx.commit().await?;

        let mut updated = order.clone();
        updated.version = new_version;
        Ok(updated)
    }

    async fn record_message_handle(
        &self,
        id: OrderId,
        channel: Channel,
        handle: MessageId,
    ) -> Result<MessageId> {
        let column = handle_column(channel);

        // Set-once: only fills the slot when it is still NULL, then reads
        // back whichever handle actually won.
        sqlx::query(&format!(
            "UPDATE orders SET {column} = $2 WHERE id = $1 AND {column} IS NULL"
        ))
        .bind(id.as_uuid())
        .bind(handle.as_i64())
        .execute(&self.pool)
        .await?;

        let stored: Option<Option<i64>> =
            sqlx::query_scalar(&format!("SELECT {column} FROM orders WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        match stored.flatten() {
            Some(value) => Ok(MessageId::new(value)),
            None => Err(StoreError::OrderNotFound(id)),
        }
    }

    async fn history(&self, id: OrderId) -> Result<Vec<StatusHistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, old_status, new_status, actor, note, changed_at
            FROM status_history
            WHERE order_id = $1
            ORDER BY changed_at ASC, id ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let old_status: Option<String> = row.try_get("old_status")?;
                Ok(StatusHistoryEntry {
                    order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
                    old_status: old_status
                        .map(|s| s.parse().map_err(StoreError::Corrupt))
                        .transpose()?,
                    new_status: parse_text::<OrderStatus>(&row, "new_status")?,
                    actor: row.try_get("actor")?,
                    note: row.try_get("note")?,
                    changed_at: row.try_get("changed_at")?,
                })
            })
            .collect()
    }

    async fn orders_for_customer(&self, chat: ChatId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            "SELECT * FROM orders WHERE customer_chat = $1 ORDER BY created_at DESC, number DESC",
        )
        .bind(chat.as_i64())
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);
            let items = Self::items_for_order(&self.pool, id).await?;
            orders.push(Self::row_to_order(&row, items)?);
        }
        Ok(orders)
    }

    async fn get_customer(&self, chat: ChatId) -> Result<Option<Customer>> {
        let row = sqlx::query(
            "SELECT chat_id, full_name, phone_number, created_at FROM customers WHERE chat_id = $1",
        )
        .bind(chat.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> Result<Customer> {
            Ok(Customer {
                chat_id: ChatId::new(row.try_get("chat_id")?),
                full_name: row.try_get("full_name")?,
                phone_number: row.try_get("phone_number")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .transpose()
    }

    async fn available_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT name, category, unit_price, is_available
            FROM products
            WHERE is_available
            ORDER BY category ASC, name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Product {
                    name: row.try_get("name")?,
                    category: row.try_get("category")?,
                    unit_price: Money::new(row.try_get("unit_price")?),
                    is_available: row.try_get("is_available")?,
                })
            })
            .collect()
    }

    async fn upsert_product(&self, product: Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (name, category, unit_price, is_available)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name)
            DO UPDATE SET category = EXCLUDED.category,
                          unit_price = EXCLUDED.unit_price,
                          is_available = EXCLUDED.is_available
            "#,
        )
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.unit_price.amount())
        .bind(product.is_available)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
