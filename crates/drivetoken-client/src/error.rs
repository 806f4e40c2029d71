//! Client error types.

use std::error::Error;
use std::fmt;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// Access token could not be obtained.
    Token(drivetoken_google::TokenError),
    /// Drive stub failed.
    Drive(drivetoken_google::DriveError),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Token(err) => write!(f, "{}", err),
            Self::Drive(err) => write!(f, "{}", err),
            Self::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl Error for ClientError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            // Token and Drive errors display themselves, so skip a level.
            Self::Token(err) => err.source(),
            Self::Drive(err) => err.source(),
            Self::Io(err) => Some(err),
            Self::Config(_) => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<drivetoken_google::TokenError> for ClientError {
    fn from(err: drivetoken_google::TokenError) -> Self {
        Self::Token(err)
    }
}

impl From<drivetoken_google::DriveError> for ClientError {
    fn from(err: drivetoken_google::DriveError) -> Self {
        Self::Drive(err)
    }
}

/// Renders an error followed by its chain of causes, one per line.
pub fn report(err: &dyn Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str("\n  caused by: ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
