//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// drivetoken - Google Drive access tokens from a stored credential
#[derive(Debug, Parser)]
#[command(name = "drivetoken")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "DRIVETOKEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a valid access token, refreshing it if the stored one expired
    Token {
        /// Also report whether the token was cached or refreshed
        #[arg(long)]
        verbose: bool,
    },

    /// List Drive files and print the raw API response
    Search,

    /// Pass a payload through the upload stub
    Upload {
        /// Payload to upload
        payload: String,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
