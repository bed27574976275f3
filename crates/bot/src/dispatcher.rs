//! Update routing: conversation flow and channel-button handling.

use chrono::Utc;
use common::ChatId;
use domain::{
    Actor, ChannelAction, CheckoutRequest, CheckoutService, Catalog, DomainError,
    TransitionService,
};
use notify::{Button, Keyboard, Messenger, NotificationSynchronizer};
use store::{GeoPoint, OrderStore, ServiceMode};

use crate::render;
use crate::session::{ContactInfo, Conversation, SessionStore, Stage};
use crate::update::BotUpdate;

/// Routes inbound updates through the shared core.
///
/// Customer conversations (cart building, checkout) run against the
/// per-chat session; kitchen/courier button presses go straight through
/// the transition service and the notifier, the same path the operator
/// surface uses.
pub struct Dispatcher<S, M> {
    checkout: CheckoutService<S>,
    transitions: TransitionService<S>,
    notifier: NotificationSynchronizer<S, M>,
    messenger: M,
    sessions: SessionStore,
}

impl<S: OrderStore, M: Messenger> Dispatcher<S, M> {
    pub fn new(
        checkout: CheckoutService<S>,
        transitions: TransitionService<S>,
        notifier: NotificationSynchronizer<S, M>,
        messenger: M,
    ) -> Self {
        Self {
            checkout,
            transitions,
            notifier,
            messenger,
            sessions: SessionStore::new(),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handles one inbound update to completion.
    #[tracing::instrument(skip(self, update), fields(chat = %update.chat()))]
    pub async fn handle(&self, update: BotUpdate) {
        match update {
            BotUpdate::Callback { chat, data } => {
                // Kitchen/courier actions carry an order id and bypass the
                // conversation entirely.
                if let Some((action, order_id)) = ChannelAction::parse(&data) {
                    self.handle_channel_action(chat, action, order_id).await;
                    return;
                }
                self.handle_conversation_callback(chat, &data).await;
            }
            BotUpdate::ContactShared { chat, name, phone } => {
                self.handle_contact(chat, ContactInfo { name, phone }).await;
            }
            BotUpdate::LocationShared {
                chat,
                latitude,
                longitude,
            } => {
                self.handle_location(
                    chat,
                    GeoPoint {
                        latitude,
                        longitude,
                    },
                )
                .await;
            }
            BotUpdate::Text { chat, text } => self.handle_text(chat, &text).await,
        }
    }

    async fn handle_channel_action(
        &self,
        chat: ChatId,
        action: ChannelAction,
        order_id: common::OrderId,
    ) {
        match self
            .transitions
            .transition(order_id, action.target_status(), Actor::Channel)
            .await
        {
            Ok(order) => self.notifier.notify_status_changed(&order).await,
            Err(
                e @ (DomainError::InvalidTransition { .. } | DomainError::NotFound(_)),
            ) => {
                self.reply(chat, &format!("❌ {e}")).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "channel action failed");
                self.reply(chat, "❌ Something went wrong, please try again.")
                    .await;
            }
        }
    }

    async fn handle_conversation_callback(&self, chat: ChatId, data: &str) {
        let conversation = self.sessions.conversation(chat).await;
        let mut conv = conversation.lock().await;

        match data {
            "main_menu" | "show_cart" => {
                let catalog = self.catalog().await;
                self.reply(chat, &render::cart_summary(&conv.cart, &catalog))
                    .await;
            }
            "service:delivery" => {
                conv.cart.set_service_mode(ServiceMode::Delivery);
                self.reply(
                    chat,
                    "🚚 Delivery selected! Share your location at checkout.",
                )
                .await;
            }
            "service:pickup" => {
                conv.cart.set_service_mode(ServiceMode::Pickup);
                self.reply(chat, "🏪 Pickup selected!").await;
            }
            "cart_clear" => {
                conv.cart.clear();
                conv.stage = Stage::Browsing;
                self.reply(chat, "🗑 Your cart has been emptied.").await;
            }
            "checkout" => self.handle_checkout(chat, &mut conv).await,
            "confirm_order" => self.handle_confirm(chat, &mut conv).await,
            "cancel_order" => {
                conv.cart.clear();
                conv.stage = Stage::Browsing;
                self.reply(chat, "❌ Order cancelled.").await;
            }
            _ => {
                if let Some(product) = data.strip_prefix("cart_add:") {
                    conv.cart.add_item(product, 1);
                    let catalog = self.catalog().await;
                    let summary = render::cart_summary(&conv.cart, &catalog);
                    self.reply(chat, &format!("✅ {product} added to the cart!\n\n{summary}"))
                        .await;
                } else if let Some(product) = data.strip_prefix("cart_inc:") {
                    conv.cart.update_item(product, 1);
                    let catalog = self.catalog().await;
                    self.reply(chat, &render::cart_summary(&conv.cart, &catalog))
                        .await;
                } else if let Some(product) = data.strip_prefix("cart_dec:") {
                    conv.cart.update_item(product, -1);
                    let catalog = self.catalog().await;
                    self.reply(chat, &render::cart_summary(&conv.cart, &catalog))
                        .await;
                } else {
                    tracing::debug!(data, "unhandled callback");
                }
            }
        }
    }

    /// Pre-flight for the confirm prompt: every gate the user can still
    /// fix cheaply is reported here, and all of them run again inside
    /// `place_order` at final confirmation.
    async fn handle_checkout(&self, chat: ChatId, conv: &mut Conversation) {
        if conv.cart.is_empty() {
            self.reply(chat, "🛒 Your cart is empty!").await;
            return;
        }

        if let Err(e) = self.checkout.ensure_open(Utc::now()) {
            conv.cart.clear();
            self.reply(chat, &format!("⏰ {e}")).await;
            return;
        }

        let catalog = self.catalog().await;
        let subtotal = conv.cart.subtotal(&catalog);
        let minimum = self.checkout.settings().minimum_order;
        if subtotal < minimum {
            self.reply(
                chat,
                &format!(
                    "❌ The minimum order is {minimum} so'm.\nCurrent total: {subtotal} so'm\nAdd {} so'm more.",
                    minimum - subtotal
                ),
            )
            .await;
            return;
        }

        if conv.contact.is_none() {
            self.reply(chat, "📱 Share your contact to place an order!")
                .await;
            return;
        }

        match conv.cart.service_mode() {
            None => {
                self.reply_with(
                    chat,
                    "🚀 Which service would you like?",
                    Keyboard::none()
                        .row(vec![Button::new("🚚 Delivery", "service:delivery")])
                        .row(vec![Button::new("🏪 Pickup", "service:pickup")]),
                )
                .await;
            }
            Some(ServiceMode::Delivery) if conv.cart.location().is_none() => {
                self.reply(chat, "📍 Please share your location:").await;
            }
            Some(_) => self.send_confirm_prompt(chat, conv).await,
        }
    }

    async fn handle_confirm(&self, chat: ChatId, conv: &mut Conversation) {
        let Some(contact) = conv.contact.clone() else {
            self.reply(chat, "📱 Share your contact to place an order!")
                .await;
            return;
        };
        let Some(mode) = conv.cart.service_mode() else {
            self.reply(chat, "🚀 Choose a service first.").await;
            return;
        };

        let request = CheckoutRequest {
            customer_chat: chat,
            customer_name: contact.name,
            customer_phone: contact.phone,
            service_mode: mode,
            payment_method: conv.cart.payment_method(),
            lines: conv
                .cart
                .items()
                .map(|(name, qty)| (name.to_string(), qty))
                .collect(),
            address: conv.cart.address().map(str::to_string),
            location: conv.cart.location(),
            note: "placed via bot checkout".to_string(),
        };

        match self.checkout.place_order(request, Utc::now()).await {
            Ok(order) => {
                self.notifier.notify_new(&order).await;
                conv.cart.clear();
                conv.stage = Stage::Browsing;
                self.reply(chat, &format!("✅ Your order #{} has been placed!", order.number))
                    .await;
            }
            Err(e @ DomainError::ServiceClosed { .. }) => {
                // The window can close between cart building and checkout.
                conv.cart.clear();
                conv.stage = Stage::Browsing;
                self.reply(chat, &format!("⏰ {e}")).await;
            }
            Err(e @ DomainError::Store(_)) => {
                tracing::error!(error = %e, "checkout failed");
                self.reply(chat, "❌ Something went wrong, please try again.")
                    .await;
            }
            Err(e) => {
                self.reply(chat, &format!("❌ {e}")).await;
            }
        }
    }

    async fn handle_contact(&self, chat: ChatId, contact: ContactInfo) {
        let conversation = self.sessions.conversation(chat).await;
        let mut conv = conversation.lock().await;
        conv.contact = Some(contact);

        if conv.cart.service_mode().is_none() {
            self.reply_with(
                chat,
                "✅ Thanks! Which service would you like?",
                Keyboard::none()
                    .row(vec![Button::new("🚚 Delivery", "service:delivery")])
                    .row(vec![Button::new("🏪 Pickup", "service:pickup")]),
            )
            .await;
        } else {
            self.reply(chat, "✅ Thanks!").await;
        }
    }

    async fn handle_location(&self, chat: ChatId, location: GeoPoint) {
        let conversation = self.sessions.conversation(chat).await;
        let mut conv = conversation.lock().await;

        if conv.cart.service_mode() != Some(ServiceMode::Delivery) {
            self.reply(chat, "🚀 Choose delivery to share a location.")
                .await;
            return;
        }

        match self.checkout.quote_delivery(location) {
            Ok(quote) => {
                if let Err(e) = conv.cart.set_delivery_quote(location, quote) {
                    self.reply(chat, &format!("❌ {e}")).await;
                    return;
                }
                conv.stage = Stage::AwaitingAddress;
                self.reply(
                    chat,
                    &format!(
                        "📍 Location received!\n📏 Distance: about {:.1} km\n💰 Delivery fee: {} so'm\n\n🏠 Send an additional address, or \"skip\".",
                        quote.distance_km, quote.fee
                    ),
                )
                .await;
            }
            Err(e @ DomainError::DeliveryUnavailable { .. }) => {
                self.reply_with(
                    chat,
                    &format!("😔 {e}\n💡 You can still use pickup!"),
                    Keyboard::none()
                        .row(vec![Button::new("🏪 Switch to pickup", "service:pickup")])
                        .row(vec![Button::new("⬅️ Main menu", "main_menu")]),
                )
                .await;
            }
            Err(e) => {
                tracing::error!(error = %e, "delivery quote failed");
                self.reply(chat, "❌ Something went wrong, please try again.")
                    .await;
            }
        }
    }

    async fn handle_text(&self, chat: ChatId, text: &str) {
        let conversation = self.sessions.conversation(chat).await;
        let mut conv = conversation.lock().await;

        if conv.stage == Stage::AwaitingAddress {
            let address = match text.trim() {
                "" | "skip" | "-" => None,
                other => Some(other.to_string()),
            };
            conv.stage = Stage::Browsing;
            if let Err(e) = conv.cart.set_address(address) {
                self.reply(chat, &format!("❌ {e}")).await;
                return;
            }
            self.reply(chat, "🏠 Address saved.").await;
            self.send_confirm_prompt(chat, &conv).await;
            return;
        }

        self.reply(chat, "📨 Message received.").await;
    }

    async fn send_confirm_prompt(&self, chat: ChatId, conv: &Conversation) {
        self.reply_with(
            chat,
            &format!(
                "💳 Payment: {}\n🔸 Press \"✅ Confirm\" to place your order:",
                conv.cart.payment_method().label()
            ),
            Keyboard::none()
                .row(vec![Button::new("✅ Confirm", "confirm_order")])
                .row(vec![Button::new("❌ Cancel", "cancel_order")]),
        )
        .await;
    }

    async fn catalog(&self) -> Catalog {
        match self.checkout.catalog().await {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::error!(error = %e, "catalog snapshot failed");
                Catalog::default()
            }
        }
    }

    async fn reply(&self, chat: ChatId, text: &str) {
        self.reply_with(chat, text, Keyboard::none()).await;
    }

    async fn reply_with(&self, chat: ChatId, text: &str, keyboard: Keyboard) {
        if let Err(e) = self.messenger.send_message(chat, text, &keyboard).await {
            tracing::warn!(chat = %chat, error = %e, "reply failed");
        }
    }
}
