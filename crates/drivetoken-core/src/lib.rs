//! Shared pieces for the drivetoken crates: tracing setup and expiry time helpers.

pub mod time;
pub mod tracing;

pub use time::{Expiry, ExpiryError};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
