//! Error types for access-token acquisition.
//!
//! Every failure while producing an access token surfaces as a single
//! [`TokenError`] that carries a [`TokenErrorCode`] and, when there is one,
//! the underlying cause as its [`source`](std::error::Error::source).

use std::fmt;
use thiserror::Error;

/// The category of a token acquisition failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenErrorCode {
    /// A configured resource (credential store, client secret) could not be read.
    ResourceMissing,
    /// Stored bytes did not match the expected record shape.
    Deserialization,
    /// Connect, timeout or transport failure during the refresh exchange.
    Network,
    /// The token endpoint answered with something other than a usable token.
    MalformedResponse,
    /// The refreshed credential could not be written back to the store.
    PersistenceFailure,
}

impl TokenErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResourceMissing => "resource_missing",
            Self::Deserialization => "deserialization_failure",
            Self::Network => "network_failure",
            Self::MalformedResponse => "malformed_response",
            Self::PersistenceFailure => "persistence_failure",
        }
    }
}

impl fmt::Display for TokenErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failure to acquire an access token.
///
/// Callers are not expected to recover from any code; the code exists for
/// diagnostics and tests.
#[derive(Debug, Error)]
pub struct TokenError {
    code: TokenErrorCode,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TokenError {
    pub fn new(code: TokenErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn resource_missing(message: impl Into<String>) -> Self {
        Self::new(TokenErrorCode::ResourceMissing, message)
    }

    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::new(TokenErrorCode::Deserialization, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(TokenErrorCode::Network, message)
    }

    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self::new(TokenErrorCode::MalformedResponse, message)
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::new(TokenErrorCode::PersistenceFailure, message)
    }

    /// Attaches the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> TokenErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token acquisition failed ({}): {}", self.code, self.message)
    }
}

/// A specialized Result type for token operations.
pub type TokenResult<T> = Result<T, TokenError>;
