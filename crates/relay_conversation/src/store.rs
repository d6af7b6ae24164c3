//! Conversation store keyed by destination.

use crate::ConversationWindow;
use parking_lot::RwLock;
use relay_core::{ChatMessage, ConversationEntry, Role};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Windows deleted for being idle past twice the maximum age
    pub removed_windows: usize,
    /// Stale entries pruned from the windows that were kept
    pub pruned_entries: usize,
    /// Windows left after the sweep
    pub live_windows: usize,
}

/// In-memory conversation windows, one per destination key.
///
/// A single reader/writer lock guards the map and every window in it:
/// `read`, `size` and the other queries share the lock, while `append`,
/// `clear` and `sweep` take it exclusively. The lock is never held across an
/// await point.
///
/// # Example
///
/// ```
/// use relay_conversation::ConversationStore;
/// use relay_core::Role;
/// use std::time::Duration;
///
/// let store = ConversationStore::new(Duration::from_secs(20 * 60));
/// store.append("general", Role::User, "hi there", Some("leela".to_string()));
/// store.append("general", Role::Assistant, "hello!", None);
///
/// let messages = store.format_for_api("general");
/// assert_eq!(messages[0].content, "leela: hi there");
/// assert_eq!(store.size("general"), 2);
/// ```
#[derive(Debug)]
pub struct ConversationStore {
    max_age: Duration,
    windows: RwLock<HashMap<String, ConversationWindow>>,
}

/// Current time on the tokio clock, so paused-clock tests apply.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

impl ConversationStore {
    /// Create an empty store whose entries live for `max_age`.
    pub fn new(max_age: Duration) -> Self {
        debug!(max_age_secs = max_age.as_secs(), "Creating conversation store");
        Self {
            max_age,
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// How long an entry stays live.
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Append an entry to `key`'s window and prune its stale prefix.
    ///
    /// Creates the window on first use. Returns the number of live entries
    /// after pruning.
    #[instrument(level = "debug", skip(self, content, author_label))]
    pub fn append(
        &self,
        key: &str,
        role: Role,
        content: impl Into<String>,
        author_label: Option<String>,
    ) -> usize {
        let mut windows = self.windows.write();
        let now = now();

        let window = windows
            .entry(key.to_string())
            .or_insert_with(|| ConversationWindow::new(key, now));
        window.push(ConversationEntry::new(role, content, author_label, now));

        let pruned = window.prune(now.checked_sub(self.max_age));
        if pruned > 0 {
            debug!(pruned, "Pruned stale entries");
        }
        window.len()
    }

    /// Copy of the live entries for `key`, oldest first.
    ///
    /// Unknown keys yield an empty list.
    pub fn read(&self, key: &str) -> Vec<ConversationEntry> {
        self.windows
            .read()
            .get(key)
            .map(|window| window.entries().iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Live entries for `key` converted to completion messages.
    ///
    /// User entries carry their author label as a `"label: "` prefix.
    pub fn format_for_api(&self, key: &str) -> Vec<ChatMessage> {
        self.windows
            .read()
            .get(key)
            .map(|window| {
                window
                    .entries()
                    .iter()
                    .map(ConversationEntry::to_chat_message)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// True when an assistant entry in `key`'s window is newer than `within`.
    pub fn engaged_within(&self, key: &str, within: Duration) -> bool {
        let cutoff = now().checked_sub(within);
        self.windows.read().get(key).is_some_and(|window| {
            window.entries().iter().rev().any(|entry| {
                *entry.role() == Role::Assistant
                    && cutoff.is_none_or(|cutoff| *entry.timestamp() > cutoff)
            })
        })
    }

    /// Delete `key`'s window regardless of freshness.
    #[instrument(level = "debug", skip(self))]
    pub fn clear(&self, key: &str) {
        if self.windows.write().remove(key).is_some() {
            debug!("Cleared conversation window");
        }
    }

    /// Number of live entries in `key`'s window.
    pub fn size(&self, key: &str) -> usize {
        self.windows.read().get(key).map_or(0, ConversationWindow::len)
    }

    /// Number of windows currently held, empty ones included.
    pub fn window_count(&self) -> usize {
        self.windows.read().len()
    }

    /// Delete idle windows and prune the rest.
    ///
    /// A window whose last append is older than twice the maximum age is
    /// removed whole. Every other window loses its stale prefix.
    pub fn sweep(&self) -> SweepReport {
        let now = now();
        let stale_cutoff = now.checked_sub(self.max_age);
        let idle_cutoff = now.checked_sub(self.max_age.saturating_mul(2));
        let mut report = SweepReport::default();

        let mut windows = self.windows.write();
        windows.retain(|_, window| {
            if window.idle_since(idle_cutoff) {
                report.removed_windows += 1;
                false
            } else {
                report.pruned_entries += window.prune(stale_cutoff);
                true
            }
        });
        report.live_windows = windows.len();

        debug!(
            removed = report.removed_windows,
            pruned = report.pruned_entries,
            live = report.live_windows,
            "Swept conversation store"
        );
        report
    }
}
