//! The completion client seam.

use async_trait::async_trait;
use relay_core::{ChatMessage, Role};
use relay_error::RemoteError;

/// Something that turns a conversation into one assistant reply.
///
/// Each call is a single attempt; retries are layered on top by
/// [`crate::RetryingCompletion`].
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Request a completion for `messages` and return the reply text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, RemoteError>;

    /// Model identifier sent with each request.
    fn model_name(&self) -> &str;
}

#[async_trait]
impl<C: CompletionClient + ?Sized> CompletionClient for std::sync::Arc<C> {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, RemoteError> {
        (**self).complete(messages).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Put `system_prompt` ahead of `history`.
///
/// An empty prompt adds nothing.
pub fn with_system_prompt(system_prompt: &str, history: Vec<ChatMessage>) -> Vec<ChatMessage> {
    if system_prompt.trim().is_empty() {
        return history;
    }
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage::new(Role::System, system_prompt));
    messages.extend(history);
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_goes_first() {
        let history = vec![ChatMessage::new(Role::User, "hi")];
        let messages = with_system_prompt("Be brief.", history);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].content, "hi");
    }

    #[test]
    fn test_blank_system_prompt_is_skipped() {
        let history = vec![ChatMessage::new(Role::User, "hi")];
        assert_eq!(with_system_prompt("  ", history.clone()), history);
    }
}
