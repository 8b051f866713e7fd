//! CareCue CLI - log in to the CareCue backend and inspect the session.
//!
//! The session persists between runs in the configured store, so a
//! `login` in one invocation is visible to `status` and `logout` in the
//! next.

mod commands;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use carecue_core::{Config, StoreKind};

#[derive(Parser)]
#[command(name = "carecue", version, about = "CareCue session client")]
struct Cli {
    /// Where the session is kept (file, keyring, memory)
    #[arg(long, global = true)]
    store: Option<StoreKind>,

    /// Backend origin, e.g. http://127.0.0.1:8000
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and remember the session
    Login {
        #[arg(long, conflicts_with = "email")]
        username: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },

    /// Register a new account from key=value fields
    Register {
        /// A registration field, e.g. --field email=a@x.com (repeatable)
        #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },

    /// Log out on the backend and clear the session
    Logout {
        /// Only clear the local session, without contacting the backend
        #[arg(long)]
        local: bool,
    },

    /// Show who is logged in
    Status,
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty field name in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Initialize the tracing subscriber for logging.
/// The returned guard must live until exit so buffered file logs flush.
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_file {
        Some(path) => {
            let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Log file path has no file name: {}", path.display()))?;
            std::fs::create_dir_all(dir).context("Failed to create log directory")?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_file.as_deref())?;

    let mut config = Config::load()?;
    if let Some(store) = cli.store {
        config.store = store;
    }
    if let Some(backend) = cli.backend {
        config.backend_url = backend;
    }
    info!(backend = %config.base_url(), store = %config.store, "CareCue CLI starting");

    match cli.command {
        Command::Login { username, email } => commands::login(&mut config, username, email).await,
        Command::Register { fields } => commands::register(&config, fields).await,
        Command::Logout { local } => commands::logout(&config, local).await,
        Command::Status => commands::status(&config),
    }
}
