//! Shared vocabulary types used across the order coordination workspace.

mod money;
mod types;
mod version;

pub use money::Money;
pub use types::{ChatId, MessageId, OrderId};
pub use version::Version;
