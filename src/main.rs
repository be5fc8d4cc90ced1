//! MCP Tool Server Entry Point
//!
//! Parses flags over the environment configuration, initializes logging
//! once, then hands control to the lifecycle controller until an interrupt
//! arrives or the transport ends.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use mcp_tool_server::cli::Cli;
use mcp_tool_server::core::{Config, LifecycleController, init_logging};

/// How long blocked stdin reads may hold up process exit.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration from environment, then apply flags
    let mut config = Config::from_env();
    cli.apply(&mut config)?;

    init_logging(&config.logging).context("Failed to initialize logging")?;
    info!("Starting {} v{}", config.server.name, config.server.version);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build async runtime")?;

    let result = runtime.block_on(LifecycleController::new(config).run(shutdown_signal()));

    // The stdio transport reads stdin on a blocking thread that only returns
    // when a line or EOF arrives.
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);

    result?;
    info!("Server shut down");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
