//! Wiring of the relay components from configuration.

use crate::RelayConfig;
use relay_conversation::{ConversationStore, SweeperHandle};
use relay_error::RelayResult;
use relay_models::{CompletionClient, OpenWebUiClient, RetryingCompletion};
use relay_rate_limit::{RateLimiter, ScopedLimiter};
use relay_social::{RelayHandler, RelaySettings};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// The shared components of a running relay.
///
/// Must be built inside a tokio runtime: the conversation sweeper is
/// spawned immediately.
#[derive(Debug)]
pub struct RelayApp {
    handler: Arc<RelayHandler>,
    store: Arc<ConversationStore>,
    limiter: Arc<ScopedLimiter>,
    upstream: Arc<RateLimiter>,
    outbound: Arc<ScopedLimiter>,
    sweeper: SweeperHandle,
}

impl RelayApp {
    /// Build everything, talking to the configured OpenWebUI endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the completion client cannot be constructed.
    #[instrument(skip_all, fields(model = %config.openwebui().model()))]
    pub fn build(config: &RelayConfig, shutdown: &CancellationToken) -> RelayResult<Self> {
        let client = OpenWebUiClient::from_config(config.openwebui())?;
        info!(url = %client.url(), "Completion client ready");
        Ok(Self::with_client(config, Arc::new(client), shutdown))
    }

    /// Build everything around an existing completion client.
    pub fn with_client(
        config: &RelayConfig,
        client: Arc<dyn CompletionClient>,
        shutdown: &CancellationToken,
    ) -> Self {
        let limiter = Arc::new(config.rate_limit().build());
        let upstream = Arc::new(config.rate_limit().upstream());
        let outbound = Arc::new(config.rate_limit().build());
        let store = Arc::new(config.context().build());
        let sweeper = store.spawn_sweeper(config.context().sweep_interval(), shutdown);

        let settings = RelaySettings::default()
            .with_command_prefix(config.discord().command_prefix().clone())
            .with_engagement(config.context().engagement())
            .with_persona(config.openwebui().system_prompt().clone());
        let completion = RetryingCompletion::new(client, config.retry().policy())
            .with_pacing(Arc::clone(&upstream));

        let handler = Arc::new(
            RelayHandler::new(
                Arc::clone(&limiter),
                Arc::clone(&store),
                completion,
                settings,
                shutdown.clone(),
            )
            .with_outbound_limiter(Arc::clone(&outbound)),
        );

        Self {
            handler,
            store,
            limiter,
            upstream,
            outbound,
            sweeper,
        }
    }

    /// The message pipeline.
    pub fn handler(&self) -> &Arc<RelayHandler> {
        &self.handler
    }

    /// The conversation store.
    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    /// Admission control.
    pub fn limiter(&self) -> &Arc<ScopedLimiter> {
        &self.limiter
    }

    /// Paces every completion attempt, retries included.
    pub fn upstream(&self) -> &Arc<RateLimiter> {
        &self.upstream
    }

    /// Paces every message part posted back to a channel.
    pub fn outbound(&self) -> &Arc<ScopedLimiter> {
        &self.outbound
    }

    /// Stop the sweeper and wait for it.
    pub async fn shutdown(self) {
        self.sweeper.shutdown().await;
        info!(windows = self.store.window_count(), "Relay stopped");
    }
}
