//! The shared checkout path: gates, pricing and atomic order creation.

use chrono::{DateTime, Utc};
use common::ChatId;
use store::{GeoPoint, NewOrder, Order, OrderStore, PaymentMethod, ServiceMode};

use crate::catalog::Catalog;
use crate::error::DomainError;
use crate::pricing::DeliveryQuote;
use crate::settings::Settings;

/// An order-creation request from either entry surface.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub customer_chat: ChatId,
    pub customer_name: String,
    pub customer_phone: String,
    pub service_mode: ServiceMode,
    pub payment_method: PaymentMethod,

    /// Product name and quantity per line; resolved against the catalog at
    /// submission time.
    pub lines: Vec<(String, u32)>,

    pub address: Option<String>,
    pub location: Option<GeoPoint>,

    /// History note describing where the order came from.
    pub note: String,
}

/// Runs the checkout gates and creates orders atomically.
pub struct CheckoutService<S> {
    store: S,
    settings: Settings,
}

impl<S: OrderStore> CheckoutService<S> {
    pub fn new(store: S, settings: Settings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Builds a fresh catalog snapshot from the store.
    pub async fn catalog(&self) -> Result<Catalog, DomainError> {
        Ok(Catalog::new(self.store.available_products().await?))
    }

    /// Rejects when `now` falls outside the service window.
    pub fn ensure_open(&self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.settings.window.is_open(now.time()) {
            Ok(())
        } else {
            Err(DomainError::ServiceClosed {
                start: self.settings.window.start,
                end: self.settings.window.end,
            })
        }
    }

    /// Quotes delivery to a location, or rejects beyond the radius.
    pub fn quote_delivery(&self, location: GeoPoint) -> Result<DeliveryQuote, DomainError> {
        let venue = self.settings.venue_location;
        let distance = crate::pricing::distance_km(
            venue.latitude,
            venue.longitude,
            location.latitude,
            location.longitude,
        );
        self.settings
            .pricing
            .quote(distance)
            .ok_or(DomainError::DeliveryUnavailable {
                distance_km: distance,
                max_radius_km: self.settings.pricing.max_radius_km,
            })
    }

    /// Validates the request and creates the order.
    ///
    /// Gates run in order: service window (re-checked here even if it
    /// passed earlier in the flow), catalog resolution, minimum order,
    /// and — for delivery — location presence and service radius with the
    /// fee recomputed at submission time. Nothing is persisted until every
    /// gate passes; the store then commits customer, order, items and the
    /// initial history row as one unit.
    #[tracing::instrument(skip(self, request), fields(customer = %request.customer_chat))]
    pub async fn place_order(
        &self,
        request: CheckoutRequest,
        now: DateTime<Utc>,
    ) -> Result<Order, DomainError> {
        self.ensure_open(now)?;

        if request.lines.is_empty() {
            return Err(DomainError::EmptyCart);
        }

        let catalog = self.catalog().await?;
        let mut items = Vec::with_capacity(request.lines.len());
        let mut subtotal = common::Money::zero();
        for (name, quantity) in &request.lines {
            let product =
                catalog
                    .resolve(name)
                    .ok_or_else(|| DomainError::ProductUnavailable {
                        product: name.clone(),
                    })?;
            let quantity = (*quantity).max(1);
            subtotal += product.unit_price.multiply(quantity);
            items.push(store::NewOrderItem::new(
                name.clone(),
                quantity,
                product.unit_price,
            ));
        }

        if subtotal < self.settings.minimum_order {
            return Err(DomainError::BelowMinimumOrder {
                subtotal,
                minimum: self.settings.minimum_order,
                shortfall: self.settings.minimum_order - subtotal,
            });
        }

        let (delivery_fee, address, location) = match request.service_mode {
            ServiceMode::Pickup => (common::Money::zero(), None, None),
            ServiceMode::Delivery => {
                let location = request.location.ok_or(DomainError::MissingLocation)?;
                let quote = self.quote_delivery(location)?;
                (quote.fee, request.address.clone(), Some(location))
            }
        };

        let order = self
            .store
            .create_order(NewOrder {
                customer_chat: request.customer_chat,
                customer_name: request.customer_name,
                customer_phone: request.customer_phone,
                service_mode: request.service_mode,
                payment_method: request.payment_method,
                subtotal,
                delivery_fee,
                total: subtotal + delivery_fee,
                address,
                location,
                items,
                note: request.note,
            })
            .await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(
            order = order.number,
            mode = %order.service_mode,
            total = %order.total,
            "order created"
        );
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::Money;
    use store::{InMemoryOrderStore, OrderStatus, Product};

    // ~2.9 km north of the default venue location.
    const NEARBY_LAT: f64 = 40.691316;
    const NEARBY_LON: f64 = 72.563908;
    // ~12 km north.
    const FARAWAY_LAT: f64 = 40.773150;
    const FARAWAY_LON: f64 = 72.563908;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap()
    }

    fn midnight() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 2, 0, 0).unwrap()
    }

    async fn service() -> CheckoutService<InMemoryOrderStore> {
        let store = InMemoryOrderStore::new();
        store
            .upsert_product(Product::new("Plov", "Mains", Money::new(15_000)))
            .await
            .unwrap();
        store
            .upsert_product(Product::new("Lagman", "Mains", Money::new(5_000)))
            .await
            .unwrap();
        CheckoutService::new(store, Settings::default())
    }

    fn delivery_request(lat: f64, lon: f64) -> CheckoutRequest {
        CheckoutRequest {
            customer_chat: ChatId::new(1),
            customer_name: "Test Customer".to_string(),
            customer_phone: "+998900000000".to_string(),
            service_mode: ServiceMode::Delivery,
            payment_method: PaymentMethod::Cash,
            lines: vec![("Plov".to_string(), 1), ("Lagman".to_string(), 1)],
            address: Some("12 Navoi street".to_string()),
            location: Some(GeoPoint {
                latitude: lat,
                longitude: lon,
            }),
            note: "placed in test".to_string(),
        }
    }

    #[tokio::test]
    async fn delivery_checkout_prices_and_creates() {
        let service = service().await;

        let order = service
            .place_order(delivery_request(NEARBY_LAT, NEARBY_LON), noon())
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.subtotal, Money::new(20_000));
        // ~2.9 km: base + 2 started-km blocks.
        assert_eq!(order.delivery_fee, Money::new(15_000));
        assert_eq!(order.total, Money::new(35_000));
        assert_eq!(order.address.as_deref(), Some("12 Navoi street"));
        assert!(order.location.is_some());
    }

    #[tokio::test]
    async fn out_of_radius_is_rejected_before_any_order_exists() {
        let service = service().await;

        let result = service
            .place_order(delivery_request(FARAWAY_LAT, FARAWAY_LON), noon())
            .await;

        assert!(matches!(
            result,
            Err(DomainError::DeliveryUnavailable { .. })
        ));
        assert_eq!(service.store.order_count().await, 0);
    }

    #[tokio::test]
    async fn pickup_checkout_strips_delivery_fields() {
        let service = service().await;
        let mut request = delivery_request(NEARBY_LAT, NEARBY_LON);
        request.service_mode = ServiceMode::Pickup;

        let order = service.place_order(request, noon()).await.unwrap();

        assert_eq!(order.delivery_fee, Money::zero());
        assert_eq!(order.total, Money::new(20_000));
        assert_eq!(order.address, None);
        assert_eq!(order.location, None);
    }

    #[tokio::test]
    async fn below_minimum_reports_shortfall() {
        let service = service().await;
        let mut request = delivery_request(NEARBY_LAT, NEARBY_LON);
        request.lines = vec![("Lagman".to_string(), 2)];

        let result = service.place_order(request, noon()).await;
        match result {
            Err(DomainError::BelowMinimumOrder {
                subtotal,
                shortfall,
                ..
            }) => {
                assert_eq!(subtotal, Money::new(10_000));
                assert_eq!(shortfall, Money::new(5_000));
            }
            other => panic!("expected BelowMinimumOrder, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn closed_window_is_rechecked_at_submission() {
        let service = service().await;

        let result = service
            .place_order(delivery_request(NEARBY_LAT, NEARBY_LON), midnight())
            .await;

        assert!(matches!(result, Err(DomainError::ServiceClosed { .. })));
        assert_eq!(service.store.order_count().await, 0);
    }

    #[tokio::test]
    async fn unresolved_product_fails_whole_submission() {
        let service = service().await;
        let mut request = delivery_request(NEARBY_LAT, NEARBY_LON);
        request
            .lines
            .push(("Retired Dish".to_string(), 1));

        let result = service.place_order(request, noon()).await;
        assert!(matches!(
            result,
            Err(DomainError::ProductUnavailable { .. })
        ));
        assert_eq!(service.store.order_count().await, 0);
    }

    #[tokio::test]
    async fn delivery_without_location_is_rejected() {
        let service = service().await;
        let mut request = delivery_request(NEARBY_LAT, NEARBY_LON);
        request.location = None;

        let result = service.place_order(request, noon()).await;
        assert!(matches!(result, Err(DomainError::MissingLocation)));
    }
}
