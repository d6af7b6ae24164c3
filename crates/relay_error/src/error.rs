//! Top-level error wrapper types.

use crate::{ConfigError, RemoteError, TransportError};

/// Aggregate of the error conditions surfaced by relay crates.
///
/// Crate-specific errors outside this crate convert into one of these
/// variants through their own `From` implementations.
///
/// # Examples
///
/// ```
/// use relay_error::{ConfigError, RelayError};
///
/// let err: RelayError = ConfigError::new("missing token").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum RelayErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Remote completion call error
    #[from(RemoteError)]
    Remote(RemoteError),
    /// Chat transport error
    #[from(TransportError)]
    Transport(TransportError),
}

/// Relay error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Relay Error: {}", _0)]
pub struct RelayError(Box<RelayErrorKind>);

impl RelayError {
    /// Create a new error from a kind.
    pub fn new(kind: RelayErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RelayErrorKind {
        &self.0
    }
}

impl<T> From<T> for RelayError
where
    T: Into<RelayErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for relay operations.
pub type RelayResult<T> = std::result::Result<T, RelayError>;
