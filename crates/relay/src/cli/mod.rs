//! Command-line interface module.

mod chat;
mod commands;
mod run;

pub use chat::run_chat;
pub use commands::{Cli, Commands};
pub use run::run_relay;
