//! Channel callback actions: inline-button presses mapped to transitions.

use common::OrderId;
use store::OrderStatus;
use uuid::Uuid;

/// An action tag carried in a kitchen or courier inline button.
///
/// Both entry surfaces map these through the same transition table; the
/// table, not the action, decides whether the press is currently legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelAction {
    KitchenConfirm,
    KitchenReady,
    KitchenPickedUp,
    KitchenCancel,
    CourierEnroute,
    CourierDelivered,
    CourierCancel,
}

impl ChannelAction {
    /// The status this action requests.
    pub fn target_status(&self) -> OrderStatus {
        match self {
            ChannelAction::KitchenConfirm => OrderStatus::Confirmed,
            ChannelAction::KitchenReady => OrderStatus::Ready,
            ChannelAction::KitchenPickedUp => OrderStatus::PickedUp,
            ChannelAction::KitchenCancel => OrderStatus::Cancelled,
            ChannelAction::CourierEnroute => OrderStatus::Enroute,
            ChannelAction::CourierDelivered => OrderStatus::Delivered,
            ChannelAction::CourierCancel => OrderStatus::Cancelled,
        }
    }

    /// The wire tag used in callback data.
    pub fn tag(&self) -> &'static str {
        match self {
            ChannelAction::KitchenConfirm => "kitchen_confirm",
            ChannelAction::KitchenReady => "kitchen_ready",
            ChannelAction::KitchenPickedUp => "kitchen_picked_up",
            ChannelAction::KitchenCancel => "kitchen_cancel",
            ChannelAction::CourierEnroute => "courier_enroute",
            ChannelAction::CourierDelivered => "courier_delivered",
            ChannelAction::CourierCancel => "courier_cancel",
        }
    }

    /// Renders the callback data for a button targeting `order_id`.
    pub fn callback_data(&self, order_id: OrderId) -> String {
        format!("{}:{}", self.tag(), order_id)
    }

    /// Parses callback data of the form `tag:order_uuid`.
    pub fn parse(data: &str) -> Option<(ChannelAction, OrderId)> {
        let (tag, id) = data.split_once(':')?;
        let action = match tag {
            "kitchen_confirm" => ChannelAction::KitchenConfirm,
            "kitchen_ready" => ChannelAction::KitchenReady,
            "kitchen_picked_up" => ChannelAction::KitchenPickedUp,
            "kitchen_cancel" => ChannelAction::KitchenCancel,
            "courier_enroute" => ChannelAction::CourierEnroute,
            "courier_delivered" => ChannelAction::CourierDelivered,
            "courier_cancel" => ChannelAction::CourierCancel,
            _ => return None,
        };
        let uuid = Uuid::parse_str(id).ok()?;
        Some((action, OrderId::from_uuid(uuid)))
    }
}
