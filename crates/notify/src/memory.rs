//! In-memory messenger for tests.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{ChatId, MessageId};

use crate::keyboard::Keyboard;
use crate::messenger::{Messenger, MessengerError};

/// A message as the platform would hold it: latest text and keyboard win.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRecord {
    pub chat: ChatId,
    pub message_id: MessageId,
    pub text: String,
    pub keyboard: Keyboard,
    /// How many times the message has been edited since it was sent.
    pub edit_count: u32,
}

#[derive(Debug, Default)]
struct InMemoryMessengerState {
    messages: Vec<MessageRecord>,
    locations: Vec<(ChatId, f64, f64)>,
    next_id: i64,
    fail_all: bool,
    failing_chat: Option<ChatId>,
}

/// In-memory messenger implementation for testing.
///
/// Records every send, edit and location pin, and can be told to fail for
/// everything or for a single chat to exercise the best-effort semantics.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMessenger {
    state: Arc<RwLock<InMemoryMessengerState>>,
}

impl InMemoryMessenger {
    /// Creates a new in-memory messenger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the messenger to fail every call.
    pub fn set_failing(&self, fail: bool) {
        self.state.write().unwrap().fail_all = fail;
    }

    /// Configures the messenger to fail calls addressed to one chat.
    pub fn set_failing_chat(&self, chat: Option<ChatId>) {
        self.state.write().unwrap().failing_chat = chat;
    }

    /// Returns the total number of distinct messages sent.
    pub fn message_count(&self) -> usize {
        self.state.read().unwrap().messages.len()
    }

    /// Returns the messages sent to a chat, in send order.
    pub fn messages_for(&self, chat: ChatId) -> Vec<MessageRecord> {
        self.state
            .read()
            .unwrap()
            .messages
            .iter()
            .filter(|m| m.chat == chat)
            .cloned()
            .collect()
    }

    /// Returns the most recent state of the single message in a chat, if
    /// exactly one was sent there.
    pub fn single_message_for(&self, chat: ChatId) -> Option<MessageRecord> {
        let messages = self.messages_for(chat);
        match messages.as_slice() {
            [one] => Some(one.clone()),
            _ => None,
        }
    }

    /// Returns the location pins sent to a chat.
    pub fn locations_for(&self, chat: ChatId) -> Vec<(f64, f64)> {
        self.state
            .read()
            .unwrap()
            .locations
            .iter()
            .filter(|(c, _, _)| *c == chat)
            .map(|(_, lat, lon)| (*lat, *lon))
            .collect()
    }

    fn check_failure(&self, chat: ChatId) -> Result<(), MessengerError> {
        let state = self.state.read().unwrap();
        if state.fail_all || state.failing_chat == Some(chat) {
            return Err(MessengerError::Transport("platform unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Messenger for InMemoryMessenger {
    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<MessageId, MessengerError> {
        self.check_failure(chat)?;

        let mut state = self.state.write().unwrap();
        state.next_id += 1;
        let message_id = MessageId::new(state.next_id);
        state.messages.push(MessageRecord {
            chat,
            message_id,
            text: text.to_string(),
            keyboard: keyboard.clone(),
            edit_count: 0,
        });
        Ok(message_id)
    }

    async fn edit_message(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<(), MessengerError> {
        self.check_failure(chat)?;

        let mut state = self.state.write().unwrap();
        let record = state
            .messages
            .iter_mut()
            .find(|m| m.chat == chat && m.message_id == message)
            .ok_or_else(|| MessengerError::Transport("message to edit not found".to_string()))?;
        record.text = text.to_string();
        record.keyboard = keyboard.clone();
        record.edit_count += 1;
        Ok(())
    }

    async fn send_location(
        &self,
        chat: ChatId,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), MessengerError> {
        self.check_failure(chat)?;
        self.state
            .write()
            .unwrap()
            .locations
            .push((chat, latitude, longitude));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::Button;

    #[tokio::test]
    async fn send_assigns_sequential_handles() {
        let messenger = InMemoryMessenger::new();
        let chat = ChatId::new(1);

        let first = messenger
            .send_message(chat, "hello", &Keyboard::none())
            .await
            .unwrap();
        let second = messenger
            .send_message(chat, "again", &Keyboard::none())
            .await
            .unwrap();

        assert_eq!(first, MessageId::new(1));
        assert_eq!(second, MessageId::new(2));
        assert_eq!(messenger.message_count(), 2);
    }

    #[tokio::test]
    async fn edit_replaces_content_in_place() {
        let messenger = InMemoryMessenger::new();
        let chat = ChatId::new(1);

        let id = messenger
            .send_message(chat, "before", &Keyboard::none())
            .await
            .unwrap();
        let keyboard = Keyboard::none().row(vec![Button::new("✅", "x")]);
        messenger
            .edit_message(chat, id, "after", &keyboard)
            .await
            .unwrap();

        let record = messenger.single_message_for(chat).unwrap();
        assert_eq!(record.text, "after");
        assert_eq!(record.edit_count, 1);
        assert_eq!(record.keyboard, keyboard);
    }

    #[tokio::test]
    async fn editing_unknown_message_fails() {
        let messenger = InMemoryMessenger::new();
        let result = messenger
            .edit_message(ChatId::new(1), MessageId::new(99), "x", &Keyboard::none())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn failing_chat_only_affects_that_chat() {
        let messenger = InMemoryMessenger::new();
        messenger.set_failing_chat(Some(ChatId::new(1)));

        assert!(
            messenger
                .send_message(ChatId::new(1), "x", &Keyboard::none())
                .await
                .is_err()
        );
        assert!(
            messenger
                .send_message(ChatId::new(2), "x", &Keyboard::none())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn locations_are_recorded() {
        let messenger = InMemoryMessenger::new();
        messenger
            .send_location(ChatId::new(5), 40.66, 72.56)
            .await
            .unwrap();
        assert_eq!(messenger.locations_for(ChatId::new(5)), vec![(40.66, 72.56)]);
    }
}
