//! Discord binding for the relay.
//!
//! Available with the `discord` feature. [`DiscordRelay`] owns the gateway
//! connection, [`RelayEventHandler`] turns Serenity events into
//! [`InboundMessage`](crate::InboundMessage)s, and [`SerenityTransport`]
//! carries the pipeline's replies back.

mod client;
mod error;
mod handler;
mod transport;

pub use client::DiscordRelay;
pub use error::{DiscordError, DiscordErrorKind, DiscordResult};
pub use handler::{READY_STATUS, RelayEventHandler};
pub use transport::SerenityTransport;
