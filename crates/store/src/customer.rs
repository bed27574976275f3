//! The customer entity.

use chrono::{DateTime, Utc};
use common::ChatId;
use serde::{Deserialize, Serialize};

/// A customer, keyed by their external chat/account identity.
///
/// Created on first order, refreshed (name/phone) on every subsequent
/// order from the same identity, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub chat_id: ChatId,
    pub full_name: String,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
}
