//! The consumed messaging-platform capability.

use async_trait::async_trait;
use common::{ChatId, MessageId};
use thiserror::Error;

use crate::keyboard::Keyboard;

/// Errors surfaced by the messaging platform.
///
/// The synchronizer treats every one of these as non-fatal: logged,
/// swallowed, transition unaffected.
#[derive(Debug, Error)]
pub enum MessengerError {
    /// The platform or the network rejected the call.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Outbound messaging capability consumed by the core.
///
/// The real client (HTTP bot API, webhook transport) lives outside this
/// workspace; the core only needs these three calls.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Sends a new message and returns its handle for later edits.
    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<MessageId, MessengerError>;

    /// Edits a previously sent message in place.
    async fn edit_message(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<(), MessengerError>;

    /// Sends a standalone location pin.
    async fn send_location(
        &self,
        chat: ChatId,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), MessengerError>;
}
