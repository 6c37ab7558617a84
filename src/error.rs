//! Error types shared by the library and its command surfaces.

use std::fmt::{Display, Formatter};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies an error that is returned to a caller of a command, so that a surface can decide how
/// to present it (e.g. a client error versus a server error).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The configuration directory or file is missing or invalid.
    Config,
    /// OAuth credentials or tokens are missing or invalid.
    Auth,
    /// The caller supplied bad input, such as a malformed date.
    Validation,
    /// Reading from or writing to the spreadsheet failed.
    Store,
    /// The completion service failed or returned something unusable.
    Completion,
    /// The MCP service failed.
    Service,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

impl ErrorType {
    /// Returns true when the error was caused by the caller's input rather than by the system.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ErrorType::Validation)
    }
}

/// An error that has been tagged with an `ErrorType` on its way out of a command.
#[derive(Debug)]
pub struct PublicError {
    error_type: ErrorType,
    inner: Error,
}

impl PublicError {
    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }
}

impl Display for PublicError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl std::error::Error for PublicError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

/// Tags an error with an `ErrorType` so that callers can classify it with `error_type`.
pub trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T> IntoResult<T> for Result<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|inner| {
            // Keep the innermost classification if the error was already tagged.
            if inner.downcast_ref::<PublicError>().is_some() {
                inner
            } else {
                Error::new(PublicError { error_type, inner })
            }
        })
    }
}

/// Returns the `ErrorType` that an error was tagged with, if any.
pub fn error_type(e: &Error) -> Option<ErrorType> {
    e.downcast_ref::<PublicError>().map(|p| p.error_type())
}
