//! Per-channel message content and keyboards.
//!
//! One builder per channel, shared by every entry surface, so the three
//! message threads always render an order the same way.

use std::fmt::Write as _;

use domain::ChannelAction;
use store::{Order, OrderStatus, ServiceMode};

use crate::keyboard::{Button, Keyboard};

/// Builds the customer-facing message: full order card plus the current
/// status line. The only action offered is returning to the main menu.
pub fn customer_message(order: &Order) -> (String, Keyboard) {
    let mut text = String::from("✅ Your order has been received!\n\n");
    let _ = writeln!(text, "📋 Order ID: #{}", order.number);
    text.push_str(&body(order, true, true));
    let _ = write!(
        text,
        "\n{} Status: {}",
        order.status.icon(),
        order.status.label()
    );

    let keyboard = Keyboard::none().row(vec![Button::new("⬅️ Main menu", "main_menu")]);
    (text, keyboard)
}

/// Builds the kitchen message with action buttons for the *current*
/// status: confirm/cancel while new, ready/cancel once confirmed,
/// picked-up/cancel for a ready pickup order, nothing afterwards.
pub fn kitchen_message(order: &Order) -> (String, Keyboard) {
    let mut text = match order.status {
        OrderStatus::New => format!("🍽 New order #{}\n\n", order.number),
        status => format!(
            "{} Order #{} status changed: {}\n\n",
            status.icon(),
            order.number,
            status.label()
        ),
    };
    text.push_str(&body(order, true, false));

    let keyboard = match (order.status, order.service_mode) {
        (OrderStatus::New, _) => Keyboard::none().row(vec![
            action_button(order, ChannelAction::KitchenConfirm, "✅ Confirm"),
            action_button(order, ChannelAction::KitchenCancel, "❌ Cancel"),
        ]),
        (OrderStatus::Confirmed, _) => Keyboard::none()
            .row(vec![action_button(order, ChannelAction::KitchenReady, "🍽 Ready")])
            .row(vec![action_button(order, ChannelAction::KitchenCancel, "❌ Cancel")]),
        (OrderStatus::Ready, ServiceMode::Pickup) => Keyboard::none()
            .row(vec![action_button(
                order,
                ChannelAction::KitchenPickedUp,
                "✅ Picked up",
            )])
            .row(vec![action_button(order, ChannelAction::KitchenCancel, "❌ Cancel")]),
        _ => Keyboard::none(),
    };

    (text, keyboard)
}

/// Builds the courier message (delivery orders only) with action buttons
/// for the current status: en-route/cancel when ready, delivered/cancel
/// while en route, nothing otherwise.
pub fn courier_message(order: &Order) -> (String, Keyboard) {
    let mut text = match order.status {
        OrderStatus::Ready => format!("🚚 New delivery order #{}\n\n", order.number),
        status => format!(
            "{} Order #{} status changed: {}\n\n",
            status.icon(),
            order.number,
            status.label()
        ),
    };
    text.push_str(&body(order, false, false));

    let keyboard = match order.status {
        OrderStatus::Ready => Keyboard::none()
            .row(vec![action_button(
                order,
                ChannelAction::CourierEnroute,
                "🚚 On the way",
            )])
            .row(vec![action_button(order, ChannelAction::CourierCancel, "❌ Cancel")]),
        OrderStatus::Enroute => Keyboard::none()
            .row(vec![action_button(
                order,
                ChannelAction::CourierDelivered,
                "✅ Delivered",
            )])
            .row(vec![action_button(order, ChannelAction::CourierCancel, "❌ Cancel")]),
        _ => Keyboard::none(),
    };

    (text, keyboard)
}

fn action_button(order: &Order, action: ChannelAction, label: &str) -> Button {
    Button::new(label, action.callback_data(order.id))
}

/// The shared informational body: customer snapshot, service details,
/// itemized lines and the total.
fn body(order: &Order, with_service_line: bool, with_maps_link: bool) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "👨‍💼 Name: {}", order.customer_name);
    let _ = writeln!(text, "📱 Phone: {}", order.customer_phone);
    let _ = writeln!(text, "💳 Payment: {}", order.payment_method.label());
    if with_service_line {
        let _ = writeln!(text, "🚀 Service: {}", order.service_mode.label());
    }

    match order.service_mode {
        ServiceMode::Delivery => {
            match order.address.as_deref() {
                Some(address) => {
                    let _ = writeln!(text, "🏠 Address: {address}");
                }
                None => text.push_str("📍 Address: location only\n"),
            }
            if with_maps_link
                && let Some(location) = order.location
            {
                let _ = writeln!(
                    text,
                    "📍 Location: https://www.google.com/maps?q={},{}",
                    location.latitude, location.longitude
                );
            }
        }
        ServiceMode::Pickup => text.push_str("🏪 Pickup: at the restaurant\n"),
    }

    text.push_str("\n🍽 Items:\n");
    for item in &order.items {
        let _ = writeln!(
            text,
            "• {} x {} - {} so'm",
            item.quantity, item.product_name, item.line_total
        );
    }
    let _ = write!(text, "\n💰 Total: {} so'm", order.total);
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::{ChatId, Money, OrderId, Version};
    use store::{GeoPoint, OrderItem, PaymentMethod};

    fn order(mode: ServiceMode, status: OrderStatus) -> Order {
        Order {
            id: OrderId::new(),
            number: 7,
            version: Version::first(),
            customer_chat: ChatId::new(1),
            customer_name: "Aziza Karimova".to_string(),
            customer_phone: "+998901234567".to_string(),
            status,
            service_mode: mode,
            payment_method: PaymentMethod::Cash,
            subtotal: Money::new(50_000),
            delivery_fee: Money::new(10_000),
            total: Money::new(60_000),
            address: Some("12 Navoi street".to_string()),
            location: Some(GeoPoint {
                latitude: 40.67,
                longitude: 72.57,
            }),
            items: vec![
                OrderItem::new("Plov", 2, Money::new(20_000)),
                OrderItem::new("Tea", 1, Money::new(10_000)),
            ],
            customer_message: None,
            kitchen_message: None,
            courier_message: None,
            created_at: Utc::now(),
            confirmed_at: None,
            ready_at: None,
            delivered_at: None,
            picked_up_at: None,
        }
    }

    fn actions(keyboard: &Keyboard) -> Vec<&str> {
        keyboard
            .buttons()
            .map(|b| b.action.split(':').next().unwrap_or(""))
            .collect()
    }

    #[test]
    fn customer_message_has_only_back_button() {
        let order = order(ServiceMode::Delivery, OrderStatus::New);
        let (text, keyboard) = customer_message(&order);

        assert!(text.contains("Order ID: #7"));
        assert!(text.contains("• 2 x Plov - 40,000 so'm"));
        assert!(text.contains("💰 Total: 60,000 so'm"));
        assert!(text.contains("🆕 Status: New"));
        assert!(text.contains("https://www.google.com/maps?q=40.67,72.57"));
        assert_eq!(actions(&keyboard), vec!["main_menu"]);
    }

    #[test]
    fn customer_message_without_address_says_location_only() {
        let mut order = order(ServiceMode::Delivery, OrderStatus::New);
        order.address = None;
        let (text, _) = customer_message(&order);
        assert!(text.contains("📍 Address: location only"));
    }

    #[test]
    fn kitchen_keyboard_follows_status() {
        let new = order(ServiceMode::Delivery, OrderStatus::New);
        assert_eq!(
            actions(&kitchen_message(&new).1),
            vec!["kitchen_confirm", "kitchen_cancel"]
        );

        let confirmed = order(ServiceMode::Delivery, OrderStatus::Confirmed);
        assert_eq!(
            actions(&kitchen_message(&confirmed).1),
            vec!["kitchen_ready", "kitchen_cancel"]
        );

        let ready_pickup = order(ServiceMode::Pickup, OrderStatus::Ready);
        assert_eq!(
            actions(&kitchen_message(&ready_pickup).1),
            vec!["kitchen_picked_up", "kitchen_cancel"]
        );

        // Kitchen is done once a delivery order is ready.
        let ready_delivery = order(ServiceMode::Delivery, OrderStatus::Ready);
        assert!(kitchen_message(&ready_delivery).1.is_empty());
        let cancelled = order(ServiceMode::Delivery, OrderStatus::Cancelled);
        assert!(kitchen_message(&cancelled).1.is_empty());
    }

    #[test]
    fn kitchen_header_reflects_status() {
        let new = order(ServiceMode::Delivery, OrderStatus::New);
        assert!(kitchen_message(&new).0.starts_with("🍽 New order #7"));

        let confirmed = order(ServiceMode::Delivery, OrderStatus::Confirmed);
        assert!(
            kitchen_message(&confirmed)
                .0
                .starts_with("✅ Order #7 status changed: Confirmed")
        );
    }

    #[test]
    fn courier_keyboard_follows_status() {
        let ready = order(ServiceMode::Delivery, OrderStatus::Ready);
        assert_eq!(
            actions(&courier_message(&ready).1),
            vec!["courier_enroute", "courier_cancel"]
        );
        assert!(courier_message(&ready).0.starts_with("🚚 New delivery order #7"));

        let enroute = order(ServiceMode::Delivery, OrderStatus::Enroute);
        assert_eq!(
            actions(&courier_message(&enroute).1),
            vec!["courier_delivered", "courier_cancel"]
        );

        let delivered = order(ServiceMode::Delivery, OrderStatus::Delivered);
        assert!(courier_message(&delivered).1.is_empty());
    }

    #[test]
    fn courier_body_skips_service_line_and_maps_link() {
        let ready = order(ServiceMode::Delivery, OrderStatus::Ready);
        let (text, _) = courier_message(&ready);
        assert!(!text.contains("🚀 Service:"));
        assert!(!text.contains("google.com/maps"));
        assert!(text.contains("🏠 Address: 12 Navoi street"));
    }

    #[test]
    fn pickup_body_shows_pickup_line() {
        let pickup = order(ServiceMode::Pickup, OrderStatus::New);
        let (text, _) = customer_message(&pickup);
        assert!(text.contains("🏪 Pickup: at the restaurant"));
        assert!(!text.contains("🏠 Address:"));
    }
}
