//! Role types for conversation participants.

use serde::{Deserialize, Serialize};

/// Author role of a conversation entry.
///
/// Serialized in lowercase, matching the chat completion wire format.
///
/// # Examples
///
/// ```
/// use relay_core::Role;
///
/// assert_eq!(format!("{}", Role::Assistant), "assistant");
/// assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions that frame the conversation
    #[display("system")]
    System,
    /// Messages from people in the channel
    #[display("user")]
    User,
    /// Replies produced by the model
    #[display("assistant")]
    Assistant,
}
