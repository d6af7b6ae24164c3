//! Error types for the chat relay.
//!
//! This crate provides the foundation error types used throughout the relay
//! workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use relay_error::{ConfigError, RelayResult};
//!
//! fn load() -> RelayResult<String> {
//!     Err(ConfigError::new("discord token is required"))?
//! }
//!
//! assert!(load().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod remote;
mod transport;

pub use config::ConfigError;
pub use error::{RelayError, RelayErrorKind, RelayResult};
pub use remote::{RemoteError, RemoteErrorKind, RetryableError};
pub use transport::{TransportError, TransportResult};
