//! Time-windowed conversation history.
//!
//! Each destination key (a channel) owns a [`ConversationWindow`] of recent
//! entries. Entries older than the store's maximum age are truncated from the
//! front whenever the window is appended to, and a background sweep started
//! with [`ConversationStore::spawn_sweeper`] prunes quiet windows and deletes
//! windows idle for twice the maximum age.
//!
//! Timestamps come from `tokio::time::Instant`, so tests drive the store with
//! tokio's paused clock.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod store;
mod sweeper;
mod window;

pub use config::ContextConfig;
pub use store::{ConversationStore, SweepReport};
pub use sweeper::SweeperHandle;
pub use window::ConversationWindow;
