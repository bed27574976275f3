//! Per-user cart session: the running selection before an order exists.

use std::collections::BTreeMap;

use common::Money;
use serde::{Deserialize, Serialize};
use store::{GeoPoint, NewOrderItem, PaymentMethod, ServiceMode};

use crate::catalog::Catalog;
use crate::error::DomainError;
use crate::pricing::DeliveryQuote;

/// A user's cart plus the transient checkout choices around it.
///
/// Process-local by design: sessions live in memory keyed by the user's
/// chat identity and are lost on restart. Cleared after both successful
/// submission and explicit cancellation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartSession {
    items: BTreeMap<String, u32>,
    service_mode: Option<ServiceMode>,
    address: Option<String>,
    location: Option<GeoPoint>,
    quote: Option<DeliveryQuote>,
    payment_method: PaymentMethod,
}

impl CartSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates cart lines in product-name order.
    pub fn items(&self) -> impl Iterator<Item = (&str, u32)> {
        self.items.iter().map(|(name, qty)| (name.as_str(), *qty))
    }

    /// Adds a product to the cart. Quantity is clamped to a minimum of 1;
    /// repeated additions accumulate.
    pub fn add_item(&mut self, name: impl Into<String>, quantity: u32) {
        *self.items.entry(name.into()).or_insert(0) += quantity.max(1);
    }

    /// Steps a line's quantity up or down; a line stepped to zero is
    /// removed.
    pub fn update_item(&mut self, name: &str, delta: i32) {
        if let Some(qty) = self.items.get_mut(name) {
            let updated = (*qty as i64 + i64::from(delta)).max(0) as u32;
            if updated == 0 {
                self.items.remove(name);
            } else {
                *qty = updated;
            }
        }
    }

    pub fn service_mode(&self) -> Option<ServiceMode> {
        self.service_mode
    }

    /// Chooses the service mode. Switching to pickup discards any
    /// previously captured delivery quote, address and location.
    pub fn set_service_mode(&mut self, mode: ServiceMode) {
        self.service_mode = Some(mode);
        if mode == ServiceMode::Pickup {
            self.address = None;
            self.location = None;
            self.quote = None;
        }
    }

    pub fn location(&self) -> Option<GeoPoint> {
        self.location
    }

    pub fn quote(&self) -> Option<DeliveryQuote> {
        self.quote
    }

    /// Records the shared location and its computed quote. Only valid once
    /// the session is in delivery mode.
    pub fn set_delivery_quote(
        &mut self,
        location: GeoPoint,
        quote: DeliveryQuote,
    ) -> Result<(), DomainError> {
        if self.service_mode != Some(ServiceMode::Delivery) {
            return Err(DomainError::DeliveryModeRequired);
        }
        self.location = Some(location);
        self.quote = Some(quote);
        Ok(())
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Records the optional free-text address. Only valid in delivery mode.
    pub fn set_address(&mut self, address: Option<String>) -> Result<(), DomainError> {
        if self.service_mode != Some(ServiceMode::Delivery) {
            return Err(DomainError::DeliveryModeRequired);
        }
        self.address = address;
        Ok(())
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = method;
    }

    /// Sums the cart against a catalog snapshot. Lines that no longer
    /// resolve count as zero here; [`CartSession::to_draft`] is the strict
    /// path.
    pub fn subtotal(&self, catalog: &Catalog) -> Money {
        self.items
            .iter()
            .fold(Money::zero(), |total, (name, qty)| {
                match catalog.resolve(name) {
                    Some(product) => total + product.unit_price.multiply(*qty),
                    None => total,
                }
            })
    }

    /// Materializes the cart into priced order lines.
    ///
    /// Every line is resolved against the catalog at submission time, not
    /// at add time. If any product no longer resolves the whole submission
    /// fails and no partial draft is produced.
    pub fn to_draft(&self, catalog: &Catalog) -> Result<OrderDraft, DomainError> {
        if self.items.is_empty() {
            return Err(DomainError::EmptyCart);
        }

        let mut lines = Vec::with_capacity(self.items.len());
        let mut subtotal = Money::zero();
        for (name, qty) in &self.items {
            let product =
                catalog
                    .resolve(name)
                    .ok_or_else(|| DomainError::ProductUnavailable {
                        product: name.clone(),
                    })?;
            subtotal += product.unit_price.multiply(*qty);
            lines.push(NewOrderItem::new(name.clone(), *qty, product.unit_price));
        }

        Ok(OrderDraft { lines, subtotal })
    }

    /// Discards all transient state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Cart lines resolved and priced at submission time.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub lines: Vec<NewOrderItem>,
    pub subtotal: Money,
}
