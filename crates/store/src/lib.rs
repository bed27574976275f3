//! Persistence layer for the order coordination system.
//!
//! Defines the persisted entities (orders, items, customers, status
//! history, products), the status/mode enums with their transition tables,
//! and the [`OrderStore`] trait with two implementations:
//! [`InMemoryOrderStore`] for tests and single-process runs, and
//! [`PostgresOrderStore`] backed by sqlx.

mod customer;
mod error;
mod memory;
mod order;
mod postgres;
mod product;
mod status;
mod store;

pub use customer::Customer;
pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use order::{GeoPoint, NewOrder, NewOrderItem, Order, OrderItem, StatusHistoryEntry};
pub use postgres::PostgresOrderStore;
pub use product::Product;
pub use status::{Channel, OrderStatus, PaymentMethod, ServiceMode};
pub use store::OrderStore;
