//! Serenity event handler that feeds the relay pipeline.

use super::SerenityTransport;
use crate::{DiscordConfig, InboundMessage, RelayHandler, strip_mentions};
use serenity::all::{ActivityData, Context, EventHandler, GatewayIntents, Message, Ready, UserId};
use serenity::async_trait;
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, info, warn};

/// Presence text set when the bot connects.
pub const READY_STATUS: &str = "Chatting with OpenWebUI";

/// Event handler for the relay bot.
pub struct RelayEventHandler {
    relay: Arc<RelayHandler>,
    config: DiscordConfig,
    bot_id: OnceLock<UserId>,
}

impl RelayEventHandler {
    /// Create a handler that relays authorized messages through `relay`.
    pub fn new(relay: Arc<RelayHandler>, config: DiscordConfig) -> Self {
        Self {
            relay,
            config,
            bot_id: OnceLock::new(),
        }
    }

    /// Gateway intents the relay needs.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT
    }
}

#[async_trait]
impl EventHandler for RelayEventHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            bot_name = %ready.user.name,
            bot_id = %ready.user.id,
            guilds = ready.guilds.len(),
            "Discord bot connected"
        );
        if self.bot_id.set(ready.user.id).is_err() {
            debug!("Bot id already recorded, reconnect");
        }
        ctx.set_activity(Some(ActivityData::custom(READY_STATUS)));
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        let channel_id = msg.channel_id.to_string();
        let guild_id = msg.guild_id.map(|g| g.to_string());
        if !self.config.is_authorized(guild_id.as_deref(), &channel_id) {
            debug!(channel_id = %channel_id, "Message from unauthorized location");
            return;
        }

        let Some(bot_id) = self.bot_id.get().copied() else {
            warn!("Message received before ready, ignoring");
            return;
        };

        let inbound = InboundMessage::builder()
            .channel_id(channel_id)
            .message_id(msg.id.to_string())
            .author(msg.author.name.clone())
            .content(strip_mentions(&msg.content, &bot_id.to_string()))
            .mentions_bot(msg.mentions_user_id(bot_id))
            .is_command(self.relay.is_command(&msg.content))
            .build();
        let inbound = match inbound {
            Ok(inbound) => inbound,
            Err(e) => {
                error!(error = %e, "Failed to build inbound message");
                return;
            }
        };

        let transport = SerenityTransport::new(ctx.http.clone(), ctx.shard.clone(), bot_id);
        let outcome = self.relay.handle(&inbound, &transport).await;
        debug!(?outcome, "Message handled");
    }
}
