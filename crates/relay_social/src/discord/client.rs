//! Discord client setup and lifecycle.

use super::{DiscordError, DiscordErrorKind, DiscordResult, RelayEventHandler};
use crate::{DiscordConfig, RelayHandler};
use serenity::Client;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Discord gateway connection driving a [`RelayHandler`].
pub struct DiscordRelay {
    client: Client,
}

impl DiscordRelay {
    /// Build the Serenity client.
    ///
    /// # Errors
    /// Returns an error if the token is empty or the client fails to build.
    #[instrument(skip_all, fields(token_len = config.token().len()))]
    pub async fn new(config: DiscordConfig, relay: Arc<RelayHandler>) -> DiscordResult<Self> {
        if config.token().trim().is_empty() {
            return Err(DiscordError::new(DiscordErrorKind::MissingToken));
        }

        let token = config.token().clone();
        let intents = RelayEventHandler::intents();
        info!(?intents, "Building Serenity client");

        let client = Client::builder(&token, intents)
            .event_handler(RelayEventHandler::new(relay, config))
            .await
            .map_err(|e| {
                DiscordError::new(DiscordErrorKind::ConnectionFailed(format!(
                    "Failed to build client: {}",
                    e
                )))
            })?;

        Ok(Self { client })
    }

    /// Run until the gateway fails or `shutdown` is cancelled.
    #[instrument(skip_all)]
    pub async fn run(mut self, shutdown: CancellationToken) -> DiscordResult<()> {
        info!("Starting Discord bot");
        let shard_manager = self.client.shard_manager.clone();

        tokio::select! {
            result = self.client.start() => {
                result.map_err(|e| {
                    DiscordError::new(DiscordErrorKind::ConnectionFailed(format!(
                        "Client error: {}",
                        e
                    )))
                })
            }
            _ = shutdown.cancelled() => {
                info!("Shutting down Discord shards");
                shard_manager.shutdown_all().await;
                Ok(())
            }
        }
    }
}
