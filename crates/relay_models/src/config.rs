//! The `[openwebui]` configuration section.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Completion endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct OpenWebUiConfig {
    /// Base URL; requests go to `{endpoint}/v1/chat/completions`
    #[serde(default = "default_endpoint")]
    endpoint: String,
    /// Bearer token
    #[serde(default)]
    api_key: String,
    /// Model identifier
    #[serde(default = "default_model")]
    model: String,
    /// Timeout for one call, independent of the retry deadline
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
    /// Open WebUI tools to enable on every request
    #[serde(default)]
    tool_ids: Vec<String>,
    /// Base persona placed ahead of the action instructions
    #[serde(default)]
    system_prompt: String,
}

fn default_endpoint() -> String {
    "http://localhost:8080".to_string()
}

fn default_model() -> String {
    "default".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for OpenWebUiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            tool_ids: Vec::new(),
            system_prompt: String::new(),
        }
    }
}

impl OpenWebUiConfig {
    /// Create a section for the given endpoint, key and model.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            ..Self::default()
        }
    }

    /// Set the per-call timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the tools to enable.
    pub fn with_tool_ids(mut self, tool_ids: Vec<String>) -> Self {
        self.tool_ids = tool_ids;
        self
    }

    /// Set the base persona.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    /// Per-call timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
