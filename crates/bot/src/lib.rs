//! Conversational entry surface.
//!
//! Inbound platform updates arrive already parsed as [`BotUpdate`]s (the
//! long-polling/webhook transport is the messaging client's concern, not
//! this crate's). The [`Dispatcher`] drives each user's conversation —
//! cart building, delivery quoting, checkout — and routes kitchen/courier
//! button presses through the shared transition service. Updates are
//! handled one at a time per conversation; different users run
//! concurrently.

mod dispatcher;
mod render;
mod session;
mod update;

pub use dispatcher::Dispatcher;
pub use session::{Conversation, ContactInfo, SessionStore, Stage};
pub use update::BotUpdate;
