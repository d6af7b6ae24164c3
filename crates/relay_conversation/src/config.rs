//! The `[context]` configuration section.

use crate::ConversationStore;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Conversation window timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ContextConfig {
    /// How long an entry stays in its window
    #[serde(default = "default_max_age_minutes")]
    max_age_minutes: u64,
    /// Period of the background sweep
    #[serde(default = "default_sweep_interval_minutes")]
    sweep_interval_minutes: u64,
    /// How recently the bot must have replied to keep following a channel
    #[serde(default = "default_engagement_minutes")]
    engagement_minutes: u64,
}

fn default_max_age_minutes() -> u64 {
    20
}

fn default_sweep_interval_minutes() -> u64 {
    5
}

fn default_engagement_minutes() -> u64 {
    20
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_age_minutes: default_max_age_minutes(),
            sweep_interval_minutes: default_sweep_interval_minutes(),
            engagement_minutes: default_engagement_minutes(),
        }
    }
}

impl ContextConfig {
    /// Create a section with explicit timings, in minutes.
    pub fn new(max_age_minutes: u64, sweep_interval_minutes: u64, engagement_minutes: u64) -> Self {
        Self {
            max_age_minutes,
            sweep_interval_minutes,
            engagement_minutes,
        }
    }

    /// Entry lifetime.
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_minutes * 60)
    }

    /// Sweep period, never shorter than one second.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs((self.sweep_interval_minutes * 60).max(1))
    }

    /// Engagement window.
    pub fn engagement(&self) -> Duration {
        Duration::from_secs(self.engagement_minutes * 60)
    }

    /// An empty store with this section's entry lifetime.
    pub fn build(&self) -> ConversationStore {
        ConversationStore::new(self.max_age())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: ContextConfig = toml::from_str("").unwrap();
        assert_eq!(config.max_age(), Duration::from_secs(1200));
        assert_eq!(config.sweep_interval(), Duration::from_secs(300));
        assert_eq!(config.engagement(), Duration::from_secs(1200));
    }

    #[test]
    fn test_zero_sweep_interval_is_clamped() {
        let config = ContextConfig::new(20, 0, 20);
        assert_eq!(config.sweep_interval(), Duration::from_secs(1));
    }
}
