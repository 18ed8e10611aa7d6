mod app;
mod catalog;
mod cli;
mod config;
mod http;
mod paths;
mod proxy;
#[cfg(test)]
mod test_server;

use anyhow::Result;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    let _log_guard = init_logging();
    app::run(cli)
}

/// Logs go to a daily file; the terminal belongs to the TUI and the player.
/// Logging is skipped when the log directory is unusable.
fn init_logging() -> Option<WorkerGuard> {
    let log_dir = paths::log_dir_path();
    std::fs::create_dir_all(&log_dir).ok()?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("aniroll")
        .filename_suffix("log")
        .build(&log_dir)
        .ok()?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("aniroll=info"));
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .init();

    tracing::info!("aniroll v{} starting", env!("CARGO_PKG_VERSION"));
    Some(guard)
}
