//! `desk` - command-line front end for the desk client.
//!
//! Every command prints pretty JSON on stdout. Failures print one line on
//! stderr and exit with status 1. Diagnostics go to stderr through `tracing`
//! (`RUST_LOG`, default `warn`).

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use desk_client::{DeskClient, DeskError, Settings};
use desk_config::{BASE_URL_ENV_VAR, DeskConfig, config_path};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::Cli;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout carries command output only.
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(env_filter)
        .init();
}

/// `--config`, else the default location.
fn config_location(cli: &Cli) -> Option<PathBuf> {
    cli.config.clone().or_else(config_path)
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let config = match config_location(cli) {
        Some(path) => {
            let config = DeskConfig::load_from(&path)?;
            if config.is_some() {
                tracing::debug!(path = %path.display(), "Loaded config");
            } else {
                tracing::debug!(
                    path = %path.display(),
                    "No config file; using environment and defaults"
                );
            }
            config
        }
        None => None,
    };

    let settings = match &cli.base_url {
        Some(base_url) => Settings::resolve_with(config.as_ref(), |name| {
            if name == BASE_URL_ENV_VAR {
                Some(base_url.clone())
            } else {
                std::env::var(name).ok()
            }
        }),
        None => Settings::resolve(config.as_ref()),
    };
    settings.context("invalid configuration")
}

async fn run(cli: Cli) -> Result<serde_json::Value> {
    let settings = load_settings(&cli)?;
    let client = DeskClient::with_observer(settings, || {
        tracing::warn!("Session expired; set a fresh session id in the config or DESK_SID");
    })?;
    cli.command.run(&client).await
}

/// The one line shown to the user.
fn describe(error: &anyhow::Error) -> String {
    match error.downcast_ref::<DeskError>() {
        Some(e) => e.user_message(),
        None => format!("{error:#}"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("desk: {e}");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("desk: {}", describe(&e));
            ExitCode::FAILURE
        }
    }
}
