//! Domain layer for the order coordination system.
//!
//! This crate provides the shared core consumed by both entry surfaces:
//! - the order state machine ([`TransitionService`])
//! - delivery pricing and service-hours gating ([`pricing`])
//! - per-user cart sessions ([`CartSession`])
//! - the checkout path ([`CheckoutService`])
//! - channel callback-action mapping ([`ChannelAction`])

pub mod callback;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod pricing;
pub mod settings;
pub mod transition;

pub use callback::ChannelAction;
pub use cart::{CartSession, OrderDraft};
pub use catalog::Catalog;
pub use checkout::{CheckoutRequest, CheckoutService};
pub use error::DomainError;
pub use pricing::{DeliveryQuote, PricingConfig, ServiceWindow, distance_km};
pub use settings::Settings;
pub use transition::{Actor, TransitionService};
