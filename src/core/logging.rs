//! Logging initialisation.
//!
//! Console output always goes to stderr because stdout carries the stdio
//! protocol. When a log file is configured it receives this crate's debug
//! output as well, including full tool parameters and results.

use std::fs::File;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use super::config::LoggingConfig;
use super::error::{Error, Result};

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let filter = EnvFilter::from_default_env().add_directive(parse_level(&config.level).into());
    let console = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_filter(filter);

    let file = match &config.file {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                Error::config(format!("Cannot open log file {}: {}", path.display(), e))
            })?;
            let targets = Targets::new()
                .with_target(env!("CARGO_CRATE_NAME"), Level::DEBUG)
                .with_default(Level::INFO);
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(targets),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| Error::internal(format!("Failed to initialize logging: {e}")))
}

/// Map a configured level name to a tracing level; unknown names mean `info`.
fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}
