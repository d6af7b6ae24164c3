//! A single destination's entries.

use derive_getters::Getters;
use relay_core::ConversationEntry;
use std::collections::VecDeque;
use std::time::Instant;

/// Ordered entries for one destination key.
///
/// Entries are kept in non-decreasing timestamp order. Pruning only ever
/// removes a contiguous prefix. A window whose entries were all pruned stays
/// in the store until the idle sweep deletes it.
#[derive(Debug, Clone, Getters)]
pub struct ConversationWindow {
    key: String,
    entries: VecDeque<ConversationEntry>,
    last_active: Instant,
}

impl ConversationWindow {
    pub(crate) fn new(key: impl Into<String>, now: Instant) -> Self {
        Self {
            key: key.into(),
            entries: VecDeque::new(),
            last_active: now,
        }
    }

    pub(crate) fn push(&mut self, entry: ConversationEntry) {
        self.last_active = *entry.timestamp();
        self.entries.push_back(entry);
    }

    /// Drop every entry stamped at or before `cutoff`, returning how many.
    pub(crate) fn prune(&mut self, cutoff: Option<Instant>) -> usize {
        // Nothing can be older than the clock's origin
        let Some(cutoff) = cutoff else {
            return 0;
        };
        let stale = self
            .entries
            .partition_point(|entry| *entry.timestamp() <= cutoff);
        self.entries.drain(..stale);
        stale
    }

    /// True when the window was last appended to before `cutoff`.
    pub(crate) fn idle_since(&self, cutoff: Option<Instant>) -> bool {
        cutoff.is_some_and(|cutoff| self.last_active < cutoff)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when every entry has been pruned.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::Role;
    use std::time::Duration;

    fn window_with(offsets: &[u64]) -> (ConversationWindow, Instant) {
        let origin = Instant::now();
        let mut window = ConversationWindow::new("general", origin);
        for secs in offsets {
            window.push(ConversationEntry::new(
                Role::User,
                format!("at {}", secs),
                None,
                origin + Duration::from_secs(*secs),
            ));
        }
        (window, origin)
    }

    #[test]
    fn test_prune_removes_prefix_only() {
        let (mut window, origin) = window_with(&[0, 10, 20, 30]);
        let removed = window.prune(Some(origin + Duration::from_secs(10)));

        assert_eq!(removed, 2);
        let remaining: Vec<_> = window.entries().iter().map(|e| e.content().clone()).collect();
        assert_eq!(remaining, vec!["at 20", "at 30"]);
    }

    #[test]
    fn test_prune_everything_keeps_window() {
        let (mut window, origin) = window_with(&[0, 5]);
        assert_eq!(window.prune(Some(origin + Duration::from_secs(60))), 2);
        assert!(window.is_empty());
        assert_eq!(window.key(), "general");
    }

    #[test]
    fn test_prune_without_cutoff_is_noop() {
        let (mut window, _) = window_with(&[0, 5]);
        assert_eq!(window.prune(None), 0);
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn test_push_tracks_last_active() {
        let (window, origin) = window_with(&[0, 42]);
        assert_eq!(*window.last_active(), origin + Duration::from_secs(42));
        assert!(window.idle_since(Some(origin + Duration::from_secs(43))));
        assert!(!window.idle_since(Some(origin + Duration::from_secs(42))));
        assert!(!window.idle_since(None));
    }
}
