//! Subcommand implementations.
//!
//! Commands write to the supplied writer instead of stdout directly.

pub mod config;
pub mod drive;
pub mod token;
