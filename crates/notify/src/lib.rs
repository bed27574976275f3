//! Notification synchronization for the three order channels.
//!
//! Keeps the customer, kitchen and courier message threads visually
//! consistent with an order's current state using a send-if-absent /
//! edit-if-present rule per channel. Message delivery is best-effort:
//! channel failures are logged and swallowed, never rolling back the
//! state transition that triggered them.

pub mod content;
mod keyboard;
mod memory;
mod messenger;
mod synchronizer;

pub use keyboard::{Button, Keyboard};
pub use memory::{InMemoryMessenger, MessageRecord};
pub use messenger::{Messenger, MessengerError};
pub use synchronizer::{ChannelConfig, NotificationSynchronizer};
