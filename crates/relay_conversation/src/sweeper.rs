//! Background eviction task.

use crate::ConversationStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Handle to a running sweep task.
///
/// Dropping the handle cancels the task. [`SweeperHandle::shutdown`] cancels
/// it and waits for it to finish.
#[derive(Debug)]
pub struct SweeperHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// True once the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stop the sweeper and wait for it to exit.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl ConversationStore {
    /// Start sweeping this store every `period` until `shutdown` fires.
    ///
    /// The task holds only a weak reference, so it also exits once the last
    /// strong reference to the store is dropped. The first sweep runs one
    /// full period after the call.
    #[instrument(skip(self, shutdown), fields(period_secs = period.as_secs()))]
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        period: Duration,
        shutdown: &CancellationToken,
    ) -> SweeperHandle {
        let period = period.max(Duration::from_millis(1));
        let store = Arc::downgrade(self);
        let token = shutdown.child_token();
        let cancelled = token.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => {
                        debug!("Conversation sweeper cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        let Some(store) = store.upgrade() else {
                            debug!("Conversation store dropped, stopping sweeper");
                            break;
                        };
                        let report = store.sweep();
                        if report.removed_windows > 0 {
                            info!(
                                removed = report.removed_windows,
                                live = report.live_windows,
                                "Evicted idle conversations"
                            );
                        }
                    }
                }
            }
        });

        info!("Started conversation sweeper");
        SweeperHandle {
            token,
            task: Some(task),
        }
    }
}
