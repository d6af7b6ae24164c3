//! The chat platform seam.

use async_trait::async_trait;
use relay_error::TransportResult;

/// Outbound operations the relay performs on a chat platform.
///
/// Channel and message identifiers are the platform's own, as strings.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Post `content` to a channel and return the new message's id.
    async fn send_message(&self, channel_id: &str, content: &str) -> TransportResult<String>;

    /// Show the typing indicator in a channel.
    async fn start_typing(&self, channel_id: &str) -> TransportResult<()>;

    /// React to a message with an emoji.
    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> TransportResult<()>;

    /// Replace the bot's presence text.
    async fn set_status(&self, status: &str) -> TransportResult<()>;

    /// Pin a message.
    async fn pin_message(&self, channel_id: &str, message_id: &str) -> TransportResult<()>;

    /// Delete the bot's most recent message in a channel, other than
    /// `exclude_id`. Returns the deleted message's id, if any.
    async fn delete_previous_bot_message(
        &self,
        channel_id: &str,
        exclude_id: &str,
    ) -> TransportResult<Option<String>>;

    /// Upload a file to a channel.
    async fn send_file(&self, channel_id: &str, filename: &str, content: &[u8])
    -> TransportResult<()>;
}
