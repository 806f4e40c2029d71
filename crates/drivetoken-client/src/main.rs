//! drivetoken CLI entry point.

use std::io;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use drivetoken_core::{TracingConfig, init_tracing};
use drivetoken_google::DriveContext;

use drivetoken_client::cli::{Cli, Command, ConfigAction};
use drivetoken_client::commands;
use drivetoken_client::config::ClientConfig;
use drivetoken_client::error::{ClientError, ClientResult, report};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", report(&e));
            return ExitCode::FAILURE;
        }
    };

    let tracing = if cli.log_json {
        TracingConfig::structured()
    } else if cli.debug || config.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli()
    };
    if let Err(e) = init_tracing(tracing) {
        eprintln!("warning: {}", e);
    }

    match run(cli.command, &config, &config_path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", report(&e));
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> ClientResult<ClientConfig> {
    match cli.config {
        Some(ref path) => ClientConfig::load_from(path),
        None => ClientConfig::load(),
    }
    .map_err(ClientError::Config)
}

async fn run(command: Command, config: &ClientConfig, config_path: &Path) -> ClientResult<()> {
    let mut out = io::stdout().lock();

    match command {
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(config, config_path, &mut out),
            ConfigAction::Validate => commands::config::validate(config, &mut out),
            ConfigAction::Path => commands::config::path(config_path, &mut out),
        },
        Command::Token { verbose } => {
            commands::token::run(&drive_context(config)?, verbose, &mut out).await
        }
        Command::Search => commands::drive::search(&drive_context(config)?, &mut out).await,
        Command::Upload { payload } => {
            commands::drive::upload(&drive_context(config)?, payload, &mut out)
        }
    }
}

fn drive_context(config: &ClientConfig) -> ClientResult<DriveContext> {
    let provider = config.provider_config().map_err(ClientError::Config)?;
    Ok(DriveContext::new(provider)?)
}
