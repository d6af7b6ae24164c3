//! Core conversation types for the chat relay.
//!
//! This crate provides the data types shared by the conversation store, the
//! completion client and the transport bindings.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod entry;
mod message;
mod role;

pub use entry::{ConversationEntry, ConversationEntryBuilder};
pub use message::ChatMessage;
pub use role::Role;
