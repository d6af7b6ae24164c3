//! Chat platform relay for the OpenWebUI completion endpoint.
//!
//! The pipeline is platform-agnostic: a binding turns platform events into
//! [`InboundMessage`]s and hands them to [`RelayHandler::handle`] together
//! with a [`ChatTransport`] for the replies.
//!
//! # Reply actions
//!
//! Completions may carry `[ACTION:type|parameters]` markers. They are parsed
//! out by [`parse_actions`], the side effects are performed through the
//! transport, and [`render_reply`] decides what text is finally sent.
//!
//! # Platform Support
//!
//! - `discord` - Discord bot binding (requires `discord` feature)

#![warn(missing_docs)]

mod actions;
mod config;
mod prompt;
mod relay;
mod reply;
mod transport;

#[cfg(feature = "discord")]
mod discord;

pub use actions::{Action, ActionKind, parse_actions};
pub use config::DiscordConfig;
pub use prompt::{ActionDescription, action_descriptions, generate_system_prompt};
pub use relay::{
    APOLOGY_REPLY, InboundMessage, InboundMessageBuilder, RATE_LIMITED_REPLY, RelayHandler,
    RelayOutcome, RelaySettings, strip_mentions,
};
pub use reply::{MESSAGE_LIMIT, ReplyPlan, SPLIT_TARGET, render_reply, split_message};
pub use transport::ChatTransport;

#[cfg(feature = "discord")]
pub use discord::{
    DiscordError, DiscordErrorKind, DiscordRelay, DiscordResult, READY_STATUS, RelayEventHandler,
    SerenityTransport,
};
