//! Logging initialization for listing-wizard.
//!
//! Interactive sessions: logs to `<state>/logs/listing-wizard-{datetime}.log`
//! One-shot subcommands: logs to stderr

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// Keeps the file writer alive for the life of the process
pub struct LoggingHandle {
    /// Dropping this flushes buffered lines to the session log
    pub _guard: Option<WorkerGuard>,

    /// Session log, when this run writes one
    pub log_file_path: Option<PathBuf>,
}

/// Install the global subscriber.
///
/// Wizard sessions own stdin/stdout, so they log to a timestamped file under
/// the state directory; every other command logs to stderr.
pub fn init_logging(
    config: &Config,
    interactive: bool,
    debug_override: bool,
) -> Result<LoggingHandle> {
    let directive = filter_directive(config, debug_override, std::env::var("RUST_LOG").ok());
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("Invalid log filter '{directive}'"))?;

    let (writer, guard, log_file_path) = if writes_to_file(config, interactive) {
        let logs_dir = config.logs_path();
        std::fs::create_dir_all(&logs_dir)
            .with_context(|| format!("Failed to create {}", logs_dir.display()))?;

        let file_name = log_file_name(chrono::Utc::now());
        let appender = tracing_appender::rolling::never(&logs_dir, &file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        (
            BoxMakeWriter::new(non_blocking),
            Some(guard),
            Some(logs_dir.join(file_name)),
        )
    } else {
        (BoxMakeWriter::new(std::io::stderr), None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(log_file_path.is_none())
                .with_writer(writer),
        )
        .try_init()
        .context("Logging was already initialized")?;

    Ok(LoggingHandle {
        _guard: guard,
        log_file_path,
    })
}

/// `RUST_LOG` wins, then `--debug`, then the configured level
fn filter_directive(config: &Config, debug_override: bool, rust_log: Option<String>) -> String {
    match rust_log.filter(|v| !v.trim().is_empty()) {
        Some(directive) => directive,
        None if debug_override => "debug".to_string(),
        None => config.logging.level.clone(),
    }
}

/// Interactive sessions own the terminal, so their logs go to a file
fn writes_to_file(config: &Config, interactive: bool) -> bool {
    interactive && config.logging.to_file
}

/// Session log file name with an ISO8601 basic timestamp
fn log_file_name(now: chrono::DateTime<chrono::Utc>) -> String {
    format!("listing-wizard-{}.log", now.format("%Y%m%dT%H%M%SZ"))
}
