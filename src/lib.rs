//! MCP Tool Server Library
//!
//! Loads tools declared in JSON manifests, registers them next to the
//! built-in `echo` and `health` tools, and serves them over MCP.
//!
//! # Architecture
//!
//! - **core**: configuration, logging, error handling, the server handler,
//!   the lifecycle controller and the stdio/SSE transports
//! - **domains**: business logic organized by bounded contexts
//!   - **tools**: descriptors, the registry, the dispatcher and the loader
//! - **cli**: command-line flags layered over the environment configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use mcp_tool_server::core::{Config, LifecycleController};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = Config::from_env();
//!     config.tools.paths.push("tools".into());
//!
//!     LifecycleController::new(config)
//!         .run(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, LifecycleController, McpServer, Result};
