//! Signal handling and graceful shutdown.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How long tracked tasks get to finish after cancellation.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(10);

/// Owns the process-wide cancellation token and the tasks that observe it.
#[derive(Debug)]
pub struct Shutdown {
    token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    grace: Duration,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE)
    }
}

impl Shutdown {
    /// A fresh token with the given grace period.
    pub fn new(grace: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            tasks: Vec::new(),
            grace,
        }
    }

    /// The token every component should watch.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Spawn a task that is awaited during [`shutdown`](Self::shutdown).
    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.push(tokio::spawn(task));
    }

    /// Resolve on ctrl-c, SIGTERM, or cancellation of the token.
    pub async fn wait_for_signal(&self) {
        tokio::select! {
            _ = ctrl_c() => info!("Received interrupt"),
            _ = terminate() => info!("Received terminate signal"),
            _ = self.token.cancelled() => info!("Shutdown requested"),
        }
    }

    /// Cancel the token and wait for tracked tasks up to the grace period.
    ///
    /// Returns false when tasks were still running at the deadline; those
    /// are aborted.
    pub async fn shutdown(self) -> bool {
        let Self { token, tasks, grace } = self;
        token.cancel();
        info!(tasks = tasks.len(), grace_secs = grace.as_secs(), "Shutting down");

        let aborts: Vec<_> = tasks.iter().map(JoinHandle::abort_handle).collect();
        let join_all = async move {
            for task in tasks {
                if let Err(e) = task.await {
                    warn!(error = %e, "Task ended abnormally");
                }
            }
        };

        match tokio::time::timeout(grace, join_all).await {
            Ok(()) => {
                info!("Shutdown complete");
                true
            }
            Err(_) => {
                warn!("Grace period elapsed, aborting remaining tasks");
                aborts.iter().for_each(|handle| handle.abort());
                false
            }
        }
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!(error = %e, "Failed to listen for SIGTERM");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
