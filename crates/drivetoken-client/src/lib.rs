//! drivetoken CLI
//!
//! Loads `config.toml`, builds a [`drivetoken_google::DriveContext`] and runs
//! one command against it.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
