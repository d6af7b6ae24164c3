//! [`ChatTransport`] over the Serenity HTTP client.

use super::error::{DiscordError, DiscordErrorKind, DiscordResult, parse_id};
use crate::ChatTransport;
use async_trait::async_trait;
use relay_error::TransportResult;
use serenity::all::{
    ActivityData, ChannelId, CreateAttachment, CreateMessage, GetMessages, Http, MessageId,
    ReactionType, ShardMessenger, UserId,
};
use std::sync::Arc;
use tracing::{debug, instrument};

/// How far back `delete_previous_bot_message` looks.
const DELETE_LOOKBACK: u8 = 50;

/// Discord transport bound to one shard and the bot's own user.
#[derive(Clone)]
pub struct SerenityTransport {
    http: Arc<Http>,
    shard: ShardMessenger,
    bot_id: UserId,
}

impl std::fmt::Debug for SerenityTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerenityTransport")
            .field("bot_id", &self.bot_id)
            .finish_non_exhaustive()
    }
}

impl SerenityTransport {
    /// Create a transport from an event context.
    pub fn new(http: Arc<Http>, shard: ShardMessenger, bot_id: UserId) -> Self {
        Self { http, shard, bot_id }
    }

    fn channel(id: &str) -> DiscordResult<ChannelId> {
        parse_id(id).map(ChannelId::new)
    }

    fn message(id: &str) -> DiscordResult<MessageId> {
        parse_id(id).map(MessageId::new)
    }
}

fn reaction(emoji: &str) -> ReactionType {
    ReactionType::try_from(emoji).unwrap_or_else(|_| ReactionType::Unicode(emoji.to_string()))
}

#[async_trait]
impl ChatTransport for SerenityTransport {
    #[instrument(skip(self, content), fields(content_length = content.len()))]
    async fn send_message(&self, channel_id: &str, content: &str) -> TransportResult<String> {
        let channel = Self::channel(channel_id)?;
        let message = channel
            .say(&*self.http, content)
            .await
            .map_err(DiscordError::from)?;
        Ok(message.id.to_string())
    }

    async fn start_typing(&self, channel_id: &str) -> TransportResult<()> {
        let channel = Self::channel(channel_id)?;
        channel
            .broadcast_typing(&*self.http)
            .await
            .map_err(DiscordError::from)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> TransportResult<()> {
        let channel = Self::channel(channel_id)?;
        let message = Self::message(message_id)?;
        channel
            .create_reaction(&*self.http, message, reaction(emoji))
            .await
            .map_err(DiscordError::from)?;
        Ok(())
    }

    async fn set_status(&self, status: &str) -> TransportResult<()> {
        self.shard
            .set_activity(Some(ActivityData::custom(status.to_string())));
        Ok(())
    }

    #[instrument(skip(self))]
    async fn pin_message(&self, channel_id: &str, message_id: &str) -> TransportResult<()> {
        let channel = Self::channel(channel_id)?;
        let message = Self::message(message_id)?;
        channel
            .pin(&*self.http, message)
            .await
            .map_err(DiscordError::from)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_previous_bot_message(
        &self,
        channel_id: &str,
        exclude_id: &str,
    ) -> TransportResult<Option<String>> {
        let channel = Self::channel(channel_id)?;
        let exclude = Self::message(exclude_id)?;
        let recent = channel
            .messages(&*self.http, GetMessages::new().limit(DELETE_LOOKBACK))
            .await
            .map_err(DiscordError::from)?;

        let Some(previous) = recent
            .iter()
            .find(|m| m.author.id == self.bot_id && m.id != exclude)
        else {
            debug!("No earlier bot message in range");
            return Ok(None);
        };

        channel
            .delete_message(&*self.http, previous.id)
            .await
            .map_err(DiscordError::from)?;
        Ok(Some(previous.id.to_string()))
    }

    #[instrument(skip(self, content), fields(bytes = content.len()))]
    async fn send_file(
        &self,
        channel_id: &str,
        filename: &str,
        content: &[u8],
    ) -> TransportResult<()> {
        if filename.is_empty() {
            return Err(DiscordError::new(DiscordErrorKind::SerenityError(
                "empty filename".to_string(),
            ))
            .into());
        }
        let channel = Self::channel(channel_id)?;
        let attachment = CreateAttachment::bytes(content.to_vec(), filename);
        channel
            .send_message(&*self.http, CreateMessage::new().add_file(attachment))
            .await
            .map_err(DiscordError::from)?;
        Ok(())
    }
}
