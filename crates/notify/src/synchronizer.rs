//! Idempotent send-or-edit synchronization of the three channels.

use common::ChatId;
use store::{Channel, Order, OrderStatus, OrderStore, ServiceMode};

use crate::content;
use crate::keyboard::Keyboard;
use crate::messenger::Messenger;

/// Where the staff channels live.
///
/// The courier channel is a single fixed operator chat; there is no
/// per-order courier assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    pub kitchen_chat: ChatId,
    pub courier_chat: ChatId,
}

impl ChannelConfig {
    pub fn new(kitchen_chat: ChatId, courier_chat: ChatId) -> Self {
        Self {
            kitchen_chat,
            courier_chat,
        }
    }

    /// Reads `KITCHEN_CHAT_ID` / `COURIER_CHAT_ID` from the environment.
    pub fn from_env() -> Self {
        fn chat(key: &str) -> ChatId {
            ChatId::new(
                std::env::var(key)
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0),
            )
        }
        Self {
            kitchen_chat: chat("KITCHEN_CHAT_ID"),
            courier_chat: chat("COURIER_CHAT_ID"),
        }
    }
}

/// Keeps the customer, kitchen and courier message threads consistent
/// with an order's authoritative state.
///
/// Per channel: if a message handle is recorded on the order, that message
/// is edited in place; otherwise a new message is sent and its handle
/// persisted (set-once) back onto the order. Every platform call is
/// best-effort — failures are logged and never abort the transition or
/// block the other channels.
pub struct NotificationSynchronizer<S, M> {
    store: S,
    messenger: M,
    channels: ChannelConfig,
}

impl<S: OrderStore, M: Messenger> NotificationSynchronizer<S, M> {
    pub fn new(store: S, messenger: M, channels: ChannelConfig) -> Self {
        Self {
            store,
            messenger,
            channels,
        }
    }

    /// Fans out the messages for a freshly created order: the customer
    /// card and the kitchen card with its confirm/cancel actions, plus a
    /// location pin to the kitchen for delivery orders.
    #[tracing::instrument(skip(self, order), fields(order = order.number))]
    pub async fn notify_new(&self, order: &Order) {
        let (text, keyboard) = content::customer_message(order);
        self.send_or_edit(order, Channel::Customer, order.customer_chat, &text, &keyboard)
            .await;

        let (text, keyboard) = content::kitchen_message(order);
        self.send_or_edit(order, Channel::Kitchen, self.channels.kitchen_chat, &text, &keyboard)
            .await;

        if order.service_mode == ServiceMode::Delivery
            && let Some(location) = order.location
            && let Err(e) = self
                .messenger
                .send_location(
                    self.channels.kitchen_chat,
                    location.latitude,
                    location.longitude,
                )
                .await
        {
            tracing::warn!(order = order.number, error = %e, "kitchen location pin failed");
        }
    }

    /// Re-renders every affected channel after a status change.
    #[tracing::instrument(skip(self, order), fields(order = order.number, status = %order.status))]
    pub async fn notify_status_changed(&self, order: &Order) {
        let (text, keyboard) = content::customer_message(order);
        self.send_or_edit(order, Channel::Customer, order.customer_chat, &text, &keyboard)
            .await;

        if kitchen_involved(order) {
            let (text, keyboard) = content::kitchen_message(order);
            self.send_or_edit(order, Channel::Kitchen, self.channels.kitchen_chat, &text, &keyboard)
                .await;
        }

        if order.service_mode == ServiceMode::Delivery {
            self.sync_courier(order).await;
        }
    }

    /// The courier thread exists only for delivery orders. The first
    /// message is created when the order reaches `ready`; afterwards the
    /// recorded message is edited in place. With no handle and any other
    /// status the thread is left untouched.
    async fn sync_courier(&self, order: &Order) {
        match order.message_handle(Channel::Courier) {
            Some(_) => {
                let (text, keyboard) = content::courier_message(order);
                self.send_or_edit(order, Channel::Courier, self.channels.courier_chat, &text, &keyboard)
                    .await;
            }
            None if order.status == OrderStatus::Ready => {
                let (text, keyboard) = content::courier_message(order);
                self.send_or_edit(order, Channel::Courier, self.channels.courier_chat, &text, &keyboard)
                    .await;

                if let Some(location) = order.location
                    && let Err(e) = self
                        .messenger
                        .send_location(
                            self.channels.courier_chat,
                            location.latitude,
                            location.longitude,
                        )
                        .await
                {
                    tracing::warn!(order = order.number, error = %e, "courier location pin failed");
                }
            }
            None => {}
        }
    }

    /// The idempotence rule: edit if a handle is recorded, send and record
    /// the returned handle otherwise.
    async fn send_or_edit(
        &self,
        order: &Order,
        channel: Channel,
        chat: ChatId,
        text: &str,
        keyboard: &Keyboard,
    ) {
        match order.message_handle(channel) {
            Some(handle) => {
                if let Err(e) = self.messenger.edit_message(chat, handle, text, keyboard).await {
                    tracing::warn!(
                        order = order.number,
                        channel = %channel,
                        error = %e,
                        "channel edit failed"
                    );
                }
            }
            None => match self.messenger.send_message(chat, text, keyboard).await {
                Ok(handle) => {
                    metrics::counter!("notifications_sent_total").increment(1);
                    if let Err(e) = self
                        .store
                        .record_message_handle(order.id, channel, handle)
                        .await
                    {
                        tracing::warn!(
                            order = order.number,
                            channel = %channel,
                            error = %e,
                            "recording message handle failed"
                        );
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        order = order.number,
                        channel = %channel,
                        error = %e,
                        "channel send failed"
                    );
                }
            },
        }
    }
}

/// Kitchen stops receiving edits once a delivery order has left its hands.
fn kitchen_involved(order: &Order) -> bool {
    !(order.service_mode == ServiceMode::Delivery
        && matches!(order.status, OrderStatus::Enroute | OrderStatus::Delivered))
}
