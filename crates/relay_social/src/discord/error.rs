//! Discord-specific error types.

use derive_getters::Getters;
use relay_error::TransportError;

/// Discord error variants.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum DiscordErrorKind {
    /// Serenity API error (HTTP, gateway or rate limit).
    #[display("Serenity API error: {_0}")]
    SerenityError(String),

    /// Not a valid Discord snowflake id.
    #[display("Invalid ID: {_0}")]
    InvalidId(String),

    /// Connection to the Discord gateway failed.
    #[display("Connection failed: {_0}")]
    ConnectionFailed(String),

    /// The bot token is empty.
    #[display("Missing bot token")]
    MissingToken,

    /// The bot has not received its ready event yet.
    #[display("Bot user not known yet")]
    NotReady,
}

/// Discord error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error, Getters)]
#[display("Discord Error: {} at line {} in {}", kind, line, file)]
pub struct DiscordError {
    kind: DiscordErrorKind,
    line: u32,
    file: &'static str,
}

impl DiscordError {
    /// Create a new DiscordError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: DiscordErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

/// Result type for Discord operations.
pub type DiscordResult<T> = Result<T, DiscordError>;

impl From<serenity::Error> for DiscordError {
    #[track_caller]
    fn from(err: serenity::Error) -> Self {
        DiscordError::new(DiscordErrorKind::SerenityError(err.to_string()))
    }
}

impl From<DiscordError> for TransportError {
    #[track_caller]
    fn from(err: DiscordError) -> Self {
        TransportError::new(err.kind.to_string())
    }
}

/// Parse a snowflake id carried as a string.
#[track_caller]
pub(crate) fn parse_id(id: &str) -> DiscordResult<u64> {
    id.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .ok_or_else(|| DiscordError::new(DiscordErrorKind::InvalidId(id.to_string())))
}
