//! Wire-level chat message.

use crate::Role;
use serde::{Deserialize, Serialize};

/// A role/content pair as sent to a chat completion endpoint.
///
/// # Examples
///
/// ```
/// use relay_core::{ChatMessage, Role};
///
/// let message = ChatMessage::new(Role::System, "Be brief.");
/// assert_eq!(message.role, Role::System);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message sender
    pub role: Role,
    /// Text content
    pub content: String,
}

impl ChatMessage {
    /// Create a message with the given role and content.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}
