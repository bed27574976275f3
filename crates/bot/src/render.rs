//! Text rendering for conversation replies.

use std::fmt::Write as _;

use domain::{CartSession, Catalog, DeliveryQuote};
use store::ServiceMode;

/// Renders the cart as the user sees it while building an order.
pub fn cart_summary(cart: &CartSession, catalog: &Catalog) -> String {
    if cart.is_empty() {
        return "🛒 Your cart is empty!".to_string();
    }

    let mut text = String::from("🛒 In your cart:\n");
    for (name, qty) in cart.items() {
        match catalog.resolve(name) {
            Some(product) => {
                let _ = writeln!(
                    text,
                    "• {} x {} - {} so'm",
                    qty,
                    name,
                    product.unit_price.multiply(qty)
                );
            }
            None => {
                let _ = writeln!(text, "• {qty} x {name} - unavailable");
            }
        }
    }

    let subtotal = cart.subtotal(catalog);
    let _ = write!(text, "\n💰 Products: {subtotal} so'm\n");

    match cart.service_mode() {
        Some(ServiceMode::Pickup) => {
            let _ = write!(text, "🏪 Pickup: free\n📊 Total: {subtotal} so'm");
        }
        Some(ServiceMode::Delivery) => match cart.quote() {
            Some(DeliveryQuote { fee, .. }) => {
                let _ = write!(
                    text,
                    "🚚 Delivery: {fee} so'm\n📊 Total: {} so'm",
                    subtotal + fee
                );
            }
            None => {
                let _ = write!(
                    text,
                    "📍 Delivery: share a location first\n📊 Total so far: {subtotal} so'm"
                );
            }
        },
        None => {
            let _ = write!(text, "📊 Total so far: {subtotal} so'm");
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Money;
    use store::{GeoPoint, Product};

    fn catalog() -> Catalog {
        Catalog::new(vec![Product::new("Plov", "Mains", Money::new(15_000))])
    }

    #[test]
    fn empty_cart_summary() {
        assert_eq!(
            cart_summary(&CartSession::new(), &catalog()),
            "🛒 Your cart is empty!"
        );
    }

    #[test]
    fn delivery_summary_with_quote_includes_fee() {
        let mut cart = CartSession::new();
        cart.set_service_mode(ServiceMode::Delivery);
        cart.add_item("Plov", 2);
        cart.set_delivery_quote(
            GeoPoint {
                latitude: 40.69,
                longitude: 72.56,
            },
            DeliveryQuote {
                distance_km: 2.9,
                fee: Money::new(15_000),
            },
        )
        .unwrap();

        let text = cart_summary(&cart, &catalog());
        assert!(text.contains("• 2 x Plov - 30,000 so'm"));
        assert!(text.contains("🚚 Delivery: 15,000 so'm"));
        assert!(text.contains("📊 Total: 45,000 so'm"));
    }

    #[test]
    fn delivery_summary_without_quote_asks_for_location() {
        let mut cart = CartSession::new();
        cart.set_service_mode(ServiceMode::Delivery);
        cart.add_item("Plov", 1);

        let text = cart_summary(&cart, &catalog());
        assert!(text.contains("share a location first"));
    }

    #[test]
    fn pickup_summary_has_no_fee() {
        let mut cart = CartSession::new();
        cart.set_service_mode(ServiceMode::Pickup);
        cart.add_item("Plov", 1);

        let text = cart_summary(&cart, &catalog());
        assert!(text.contains("🏪 Pickup: free"));
        assert!(text.contains("📊 Total: 15,000 so'm"));
    }
}
