//! Relay - Discord chat relay for an OpenWebUI completion endpoint
//!
//! Messages that mention the bot (or use its command prefix) are passed,
//! together with the channel's recent history, to an OpenAI-compatible chat
//! completion endpoint. Replies go back to the channel after any embedded
//! actions have been carried out.
//!
//! # Architecture
//!
//! - `relay_error` - Error types
//! - `relay_core` - Conversation data types
//! - `relay_rate_limit` - Token buckets, scoped admission and retries
//! - `relay_conversation` - Time-windowed conversation store
//! - `relay_models` - OpenWebUI completion client
//! - `relay_social` - Relay pipeline and Discord binding
//!
//! This crate wires them together from configuration and re-exports the
//! commonly used types.
//!
//! # Cargo Features
//!
//! - `discord` - Discord gateway support for the `run` command

#![warn(missing_docs)]

mod app;
mod config;
mod console;
mod shutdown;
mod telemetry;

pub use app::RelayApp;
pub use config::{LogFormat, LoggingConfig, RelayConfig};
pub use console::{ConsoleTransport, relay_lines};
pub use shutdown::{DEFAULT_GRACE, Shutdown};
pub use telemetry::init_telemetry;

pub use relay_conversation::{ContextConfig, ConversationStore};
pub use relay_core::{ChatMessage, ConversationEntry, Role};
pub use relay_error::{ConfigError, RelayError, RelayErrorKind, RelayResult};
pub use relay_models::{CompletionClient, OpenWebUiClient, OpenWebUiConfig, RetryingCompletion};
pub use relay_rate_limit::{RateLimitConfig, RateLimiter, RetryConfig, RetryExecutor, ScopedLimiter};
pub use relay_social::{
    ChatTransport, DiscordConfig, InboundMessage, RelayHandler, RelayOutcome, RelaySettings,
};
