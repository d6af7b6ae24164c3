//! Retry wrapper around a completion client.

use crate::CompletionClient;
use relay_core::ChatMessage;
use relay_error::RemoteError;
use relay_rate_limit::{RateLimiter, RetryError, RetryExecutor, RetryPolicy};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// A [`CompletionClient`] driven by a [`RetryExecutor`].
///
/// Timeouts, truncated streams, 429 and 5xx responses are retried with
/// backoff. Anything else fails on the first attempt. With a pacing limiter
/// every attempt, retries included, first waits for a token.
#[derive(Debug, Clone)]
pub struct RetryingCompletion<C> {
    client: C,
    executor: RetryExecutor,
    pacing: Option<Arc<RateLimiter>>,
}

impl<C: CompletionClient> RetryingCompletion<C> {
    /// Wrap `client` with the given retry policy.
    pub fn new(client: C, policy: RetryPolicy) -> Self {
        Self {
            client,
            executor: RetryExecutor::new(policy),
            pacing: None,
        }
    }

    /// Pace every attempt through `limiter`.
    pub fn with_pacing(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.pacing = Some(limiter);
        self
    }

    /// The wrapped client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The retry policy in force.
    pub fn policy(&self) -> &RetryPolicy {
        self.executor.policy()
    }

    /// The limiter attempts wait on, if any.
    pub fn pacing(&self) -> Option<&Arc<RateLimiter>> {
        self.pacing.as_ref()
    }

    /// Request a completion, retrying transient failures until the policy
    /// gives up or `cancel` fires.
    #[instrument(skip_all, fields(model = self.client.model_name(), message_count = messages.len()))]
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        cancel: &CancellationToken,
    ) -> Result<String, RetryError<RemoteError>> {
        let client = &self.client;
        let pacing = self.pacing.as_deref();
        let reply = self
            .executor
            .execute(
                move || async move {
                    if let Some(limiter) = pacing {
                        limiter.wait_and_consume().await;
                        debug!(remaining = limiter.remaining(), "Upstream token acquired");
                    }
                    client.complete(messages).await
                },
                cancel,
            )
            .await?;
        info!(reply_len = reply.len(), "Completion received");
        Ok(reply)
    }
}
