//! slotbook CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use slotbook_client::cli::{Cli, Command, ConfigAction};
use slotbook_client::commands;
use slotbook_client::config::ClientConfig;
use slotbook_client::error::{ClientError, ClientResult};
use slotbook_core::{TracingConfig, TracingOutputFormat, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = setup_tracing(&cli, &config) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli, config).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {}", e);
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

fn setup_tracing(cli: &Cli, config: &ClientConfig) -> ClientResult<()> {
    let mut tracing_config = if cli.debug || config.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::default()
    };
    if let Some(ref format) = cli.log_format {
        let format: TracingOutputFormat = format
            .parse()
            .map_err(|e: slotbook_core::TracingError| ClientError::Usage(e.to_string()))?;
        tracing_config = tracing_config.with_format(format);
    }
    init_tracing(tracing_config).map_err(|e| ClientError::Config(e.to_string()))
}

/// Runs the selected command. `Ok(false)` means the command ran but failed.
async fn run(cli: Cli, config: ClientConfig) -> ClientResult<bool> {
    match cli.command {
        Command::Schedule(args) => commands::schedule::run(args, &config).await,
        Command::Slots(args) => commands::slots::run(args, &config).await.map(|()| true),
        Command::Config { action } => {
            match action {
                ConfigAction::Dump => commands::config::dump(&config)?,
                ConfigAction::Validate => commands::config::validate(&config)?,
                ConfigAction::Path => commands::config::path()?,
            }
            Ok(true)
        }
    }
}
