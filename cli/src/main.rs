//! Pacer CLI - headless front end for the Pacer API.
//!
//! ```text
//! main() -> Cli::parse (clap) -> PacerConfig -> AuthClient + Session -> command
//! ```
//!
//! Redirects to the login page cannot be followed from a terminal, so the
//! CLI uses a [`LoggingNavigator`]: an expired session is reported in the log
//! together with the login location, and the command fails with the
//! session-expired error.

mod args;
mod commands;

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    process::ExitCode,
    sync::{Arc, Mutex},
};

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use pacer_client::{AuthClient, LoggingNavigator};
use pacer_config::PacerConfig;
use pacer_session::Session;
use pacer_utils::DeviceIdStore;

use clap::Parser;

use args::{Cli, Command};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_pacer_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::debug!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // Output on stdout is command data; diagnostics go to stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
    for warning in init_warnings {
        tracing::warn!("{warning}");
    }
}

fn open_pacer_log_file() -> (Option<(PathBuf, std::fs::File)>, Vec<String>) {
    let candidates = pacer_log_file_candidates();
    let mut warnings = Vec::new();

    for candidate in candidates {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn pacer_log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.pacer/logs/pacer.log
    if let Some(home) = pacer_config::pacer_home() {
        candidates.push(home.join("logs").join("pacer.log"));
    }

    // Fallback: ./.pacer/logs/pacer.log
    candidates.push(PathBuf::from(".pacer").join("logs").join("pacer.log"));

    candidates
}

fn load_config(path: Option<&Path>) -> Result<PacerConfig> {
    let Some(path) = path else {
        return PacerConfig::load().context("loading configuration");
    };
    let mut config = PacerConfig::load_from(path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;
    config.apply_env_overrides(|key| std::env::var(key).ok());
    config.validate().context("validating configuration")?;
    Ok(config)
}

fn device_store(config: &PacerConfig) -> Result<DeviceIdStore> {
    let path = config
        .device_id_path()
        .context("no home directory; set device.id_path in the config file")?;
    Ok(DeviceIdStore::new(path))
}

async fn run(cli: Cli) -> Result<()> {
    if cli.command == Command::Nav {
        commands::nav();
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;
    let store = device_store(&config)?;

    if let Command::DeviceId { reset } = cli.command {
        return commands::device_id(&store, reset);
    }

    let navigator = Arc::new(LoggingNavigator::new(config.auth.login_page.clone()));
    let client = AuthClient::from_config(&config, navigator.clone())
        .context("building HTTP client")?;
    let device_id = store.get_or_create().context("loading device id")?;
    let session = Session::new(Arc::new(client), device_id);

    let credentials = commands::env_credentials();
    match cli.command {
        Command::WhoAmI => commands::whoami(&session, credentials).await,
        Command::Get { paths } => commands::get(&session, &navigator, credentials, &paths).await,
        Command::Logout => commands::logout(&session, credentials).await,
        Command::Nav | Command::DeviceId { .. } => Ok(()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "Command failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
