//! Psychology center console
//!
//! Single binary that:
//! 1. Loads configuration and the persisted admin session
//! 2. Verifies the session with the backend
//! 3. Renders public and admin pages through the route guard
//! 4. Runs admin and public writes, re-rendering the refreshed view

mod app;
mod cli;
mod config;
mod error;
mod pages;
mod routes;

use std::io::BufRead;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use center_api::ApiClient;
use center_auth::{AuthGateway, FileSessionStore};
use clap::Parser;
use common::Secret;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::cli::{Cli, Command, LogFormat};
use crate::config::Config;

const PASSWORD_ENV: &str = "CENTER_ADMIN_PASSWORD";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("center-admin: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing with LOG_LEVEL / RUST_LOG support. Logs go to stderr
/// so page output on stdout stays clean.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    info!("starting center-admin");

    let config = match Config::resolve_path(cli.config.as_deref()) {
        Some(path) => Config::load(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load_default().context("failed to load default configuration")?,
    };
    let session_path = config
        .session_path()
        .context("failed to resolve session file location")?;

    debug!(
        base_url = %config.backend.base_url,
        timeout_secs = config.backend.timeout_secs,
        session = %session_path.display(),
        "configuration loaded"
    );

    let http = reqwest::Client::builder()
        .timeout(config.timeout())
        .build()
        .context("failed to build HTTP client")?;
    let store = Arc::new(FileSessionStore::open(session_path));
    let gateway = Arc::new(AuthGateway::new(
        http.clone(),
        config.backend.base_url.as_str(),
        store,
    ));
    let api = ApiClient::new(http, Arc::clone(&gateway));
    let app = App::new(gateway, api);

    let password = match &cli.command {
        Command::Login(args) if args.password_stdin => Some(
            password_from(std::io::stdin().lock()).context("failed to read password from stdin")?,
        ),
        Command::Login(_) => std::env::var(PASSWORD_ENV).ok().map(Secret::new),
        _ => None,
    };

    let result = app.execute(cli.command, password).await;

    match result {
        Ok(page) => {
            print!("{page}");
            print!("{}", pages::notices(&app.drain_notices()));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            print!("{}", pages::notices(&app.drain_notices()));
            eprintln!("center-admin: {e}");
            Ok(ExitCode::from(e.exit_code()))
        }
    }
}

/// First line of `reader`, without its line ending.
fn password_from(mut reader: impl BufRead) -> std::io::Result<Secret<String>> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    let len = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(len);
    Ok(Secret::new(line))
}
