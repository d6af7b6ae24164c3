//! The `[discord]` configuration section.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Chat platform connection and authorization settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct DiscordConfig {
    /// Bot token
    #[serde(default)]
    token: String,
    /// Guilds the bot answers in; empty with no channels means everywhere
    #[serde(default)]
    authorized_guilds: Vec<String>,
    /// Channels the bot answers in, in addition to authorized guilds
    #[serde(default)]
    authorized_channels: Vec<String>,
    /// Prefix that marks a message as a command
    #[serde(default = "default_command_prefix")]
    command_prefix: String,
}

fn default_command_prefix() -> String {
    "!".to_string()
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            authorized_guilds: Vec::new(),
            authorized_channels: Vec::new(),
            command_prefix: default_command_prefix(),
        }
    }
}

impl DiscordConfig {
    /// Create a section with the given token and default authorization.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    /// Restrict the bot to these guilds.
    pub fn with_authorized_guilds(mut self, guilds: Vec<String>) -> Self {
        self.authorized_guilds = guilds;
        self
    }

    /// Restrict the bot to these channels.
    pub fn with_authorized_channels(mut self, channels: Vec<String>) -> Self {
        self.authorized_channels = channels;
        self
    }

    /// Set the command prefix.
    pub fn with_command_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.command_prefix = prefix.into();
        self
    }

    /// True when a message from `guild_id`/`channel_id` may be answered.
    ///
    /// With no guilds and no channels configured every message is allowed.
    /// Otherwise either the guild or the channel must be listed.
    pub fn is_authorized(&self, guild_id: Option<&str>, channel_id: &str) -> bool {
        if self.authorized_guilds.is_empty() && self.authorized_channels.is_empty() {
            return true;
        }
        guild_id.is_some_and(|guild| self.authorized_guilds.iter().any(|g| g == guild))
            || self.authorized_channels.iter().any(|c| c == channel_id)
    }
}
