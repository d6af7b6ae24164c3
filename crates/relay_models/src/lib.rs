//! Chat completion client for the relay.
//!
//! The relay talks to an OpenAI-compatible chat completion endpoint, in
//! practice an Open WebUI instance.
//!
//! - [`CompletionClient`] - the seam the relay pipeline calls through
//! - [`OpenWebUiClient`] - the HTTP implementation
//! - [`RetryingCompletion`] - wraps any client in a
//!   [`relay_rate_limit::RetryExecutor`]
//!
//! # Example
//!
//! ```no_run
//! use relay_core::{ChatMessage, Role};
//! use relay_models::{CompletionClient, OpenWebUiClient};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenWebUiClient::new(
//!     "http://localhost:8080",
//!     "sk-local",
//!     "llama3",
//!     Duration::from_secs(60),
//! )?;
//! let reply = client
//!     .complete(&[ChatMessage::new(Role::User, "Hello")])
//!     .await?;
//! println!("{}", reply);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod dto;
mod openwebui;
mod retrying;

pub use client::{CompletionClient, with_system_prompt};
pub use config::OpenWebUiConfig;
pub use dto::{
    ApiErrorBody, ApiErrorResponse, ChatCompletionRequest, ChatCompletionRequestBuilder,
    ChatCompletionResponse, Choice, Usage,
};
pub use openwebui::OpenWebUiClient;
pub use retrying::RetryingCompletion;
