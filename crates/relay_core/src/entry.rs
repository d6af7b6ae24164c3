//! Timestamped entries of a conversation window.

use crate::{ChatMessage, Role};
use derive_getters::Getters;
use std::time::Instant;

/// One message held in a conversation window.
///
/// Entries are immutable once built; the conversation store hands out clones.
///
/// # Examples
///
/// ```
/// use relay_core::{ConversationEntry, Role};
/// use std::time::Instant;
///
/// let entry = ConversationEntry::builder()
///     .role(Role::User)
///     .content("hello")
///     .author_label(Some("fry".to_string()))
///     .timestamp(Instant::now())
///     .build()
///     .unwrap();
///
/// assert_eq!(entry.to_chat_message().content, "fry: hello");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct ConversationEntry {
    /// Who produced the message
    role: Role,
    /// Text content
    content: String,
    /// Display name of the author, when known
    #[builder(default)]
    author_label: Option<String>,
    /// When the entry was appended
    timestamp: Instant,
}

impl ConversationEntry {
    /// Creates a new builder for `ConversationEntry`.
    pub fn builder() -> ConversationEntryBuilder {
        ConversationEntryBuilder::default()
    }

    /// Create an entry directly from its parts.
    pub fn new(
        role: Role,
        content: impl Into<String>,
        author_label: Option<String>,
        timestamp: Instant,
    ) -> Self {
        Self {
            role,
            content: content.into(),
            author_label,
            timestamp,
        }
    }

    /// Convert to the wire message sent upstream.
    ///
    /// User entries with a non-empty author label are prefixed with
    /// `"{label}: "` so the model can tell speakers apart.
    pub fn to_chat_message(&self) -> ChatMessage {
        let content = match (&self.role, self.author_label.as_deref()) {
            (Role::User, Some(label)) if !label.is_empty() => {
                format!("{}: {}", label, self.content)
            }
            _ => self.content.clone(),
        };
        ChatMessage::new(self.role, content)
    }
}
