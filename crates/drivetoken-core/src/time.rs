//! Expiry instants for stored OAuth credentials.
//!
//! Credential stores record expiration as milliseconds since the Unix epoch.
//! [`Expiry`] keeps that representation on the wire and exposes it as a
//! [`chrono`] datetime in memory.

use chrono::{DateTime, Duration, Local, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when building an [`Expiry`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpiryError {
    /// The millisecond value does not map to a representable datetime.
    #[error("expiration {0} ms is out of range")]
    OutOfRange(i64),

    /// Adding the offset overflows the representable datetime range.
    #[error("expiration {0} s from now is out of range")]
    OffsetOutOfRange(i64),
}

/// The instant at which an access token stops being valid.
///
/// Serialized as an integer count of milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Expiry(DateTime<Utc>);

impl Expiry {
    /// Creates an expiry from epoch milliseconds.
    pub fn from_millis(millis: i64) -> Result<Self, ExpiryError> {
        DateTime::from_timestamp_millis(millis)
            .map(Self)
            .ok_or(ExpiryError::OutOfRange(millis))
    }

    /// Creates an expiry `secs` seconds after `now`.
    pub fn after(now: DateTime<Utc>, secs: i64) -> Result<Self, ExpiryError> {
        Duration::try_seconds(secs)
            .and_then(|offset| now.checked_add_signed(offset))
            .map(Self)
            .ok_or(ExpiryError::OffsetOutOfRange(secs))
    }

    /// Epoch milliseconds, as stored.
    pub fn as_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    pub fn as_utc(&self) -> DateTime<Utc> {
        self.0
    }

    /// The expiry in the system's local timezone, for display.
    pub fn to_local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    /// Returns true if the expiry lies strictly before `now`.
    ///
    /// An expiry equal to `now` is still valid.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.0 < now
    }

    /// Time left until expiry; negative once expired.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        self.0 - now
    }
}

impl TryFrom<i64> for Expiry {
    type Error = ExpiryError;

    fn try_from(millis: i64) -> Result<Self, Self::Error> {
        Self::from_millis(millis)
    }
}

impl From<Expiry> for i64 {
    fn from(expiry: Expiry) -> Self {
        expiry.as_millis()
    }
}

impl From<DateTime<Utc>> for Expiry {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}
