//! Per-user conversation state.

use std::collections::HashMap;
use std::sync::Arc;

use common::ChatId;
use domain::CartSession;
use tokio::sync::{Mutex, RwLock};

/// Where the conversation currently expects free-text input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Browsing,

    /// The next text message is the optional delivery address.
    AwaitingAddress,
}

/// Contact details captured from a contact share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactInfo {
    pub name: String,
    pub phone: String,
}

/// One user's conversation: their cart plus surface-level state.
///
/// Process-local and lost on restart by design — it feeds order creation
/// and is not a record of anything.
#[derive(Debug, Default)]
pub struct Conversation {
    pub cart: CartSession,
    pub contact: Option<ContactInfo>,
    pub stage: Stage,
}

/// Registry of conversations keyed by chat identity.
///
/// Each conversation sits behind its own mutex: the dispatcher holds it
/// for the whole of one update, so a user's updates apply one at a time
/// while different users proceed concurrently.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<ChatId, Arc<Mutex<Conversation>>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the conversation for a chat, creating it on first contact.
    pub async fn conversation(&self, chat: ChatId) -> Arc<Mutex<Conversation>> {
        if let Some(conversation) = self.sessions.read().await.get(&chat) {
            return conversation.clone();
        }
        self.sessions
            .write()
            .await
            .entry(chat)
            .or_default()
            .clone()
    }

    /// Number of live conversations.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
