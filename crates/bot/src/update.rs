//! Parsed inbound updates from the messaging platform.

use common::ChatId;

/// One inbound event, already decoded by the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum BotUpdate {
    /// The user shared their contact card.
    ContactShared {
        chat: ChatId,
        name: String,
        phone: String,
    },

    /// The user shared a location pin.
    LocationShared {
        chat: ChatId,
        latitude: f64,
        longitude: f64,
    },

    /// A plain text message.
    Text { chat: ChatId, text: String },

    /// An inline-button press; `data` carries the action tag.
    Callback { chat: ChatId, data: String },
}

impl BotUpdate {
    /// The conversation this update belongs to.
    pub fn chat(&self) -> ChatId {
        match self {
            BotUpdate::ContactShared { chat, .. }
            | BotUpdate::LocationShared { chat, .. }
            | BotUpdate::Text { chat, .. }
            | BotUpdate::Callback { chat, .. } => *chat,
        }
    }
}
