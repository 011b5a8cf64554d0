//! rollcall - a command-line console for the school user-management service.
//!
//! Sign in with a local ID, view your own profile, and (as an administrator)
//! list, register, soft-delete, bulk import/delete and export user records.

mod cli;
mod commands;
mod render;

use std::io;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Command};
use commands::Context;

/// Log file name prefix inside `--log-dir`
const LOG_FILE_PREFIX: &str = "rollcall.log";

/// Initialize the tracing subscriber for logging.
/// The returned guard must live until exit so buffered file logs are flushed.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

async fn run(cli: Cli) -> Result<()> {
    let mut ctx = Context::new(cli.api_url)?;

    match cli.command {
        Command::Login { id } => commands::auth::login(&mut ctx, id).await,
        Command::LoginGoogle => commands::auth::login_google(&ctx).await,
        Command::Logout => commands::auth::logout(&ctx).await,
        Command::Me { json } => commands::profile::me(&ctx, json).await,
        Command::Status => commands::auth::status(&ctx).await,
        Command::Users(command) => commands::users::run(&ctx, command).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_dir.as_deref());
    info!("rollcall starting");

    let result = run(cli).await;

    info!("rollcall finished");
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
