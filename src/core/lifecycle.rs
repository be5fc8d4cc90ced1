//! Server lifecycle controller.
//!
//! Startup runs strictly in order: load tools, freeze the registry, bind the
//! transport, accept traffic. Shutdown stops accepting, lets in-flight
//! invocations finish, then closes.
//!
//! ```text
//! Uninitialized -> Loading -> Ready -> Listening -> ShuttingDown -> Stopped
//! ```
//!
//! Any state may move straight to `Stopped` (e.g. on a bind failure).

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::config::Config;
use super::error::{Error, Result};
use super::server::McpServer;
use super::transport::TransportService;
use crate::domains::tools::{LoadError, ToolDescriptor, ToolLoader, ToolOrigin, ToolRegistry};

/// Server lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Loading,
    Ready,
    Listening,
    ShuttingDown,
    Stopped,
}

impl LifecycleState {
    /// Whether moving from `self` to `next` is allowed.
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        match (self, next) {
            (Stopped, _) => false,
            (_, Stopped) => true,
            (Uninitialized, Loading)
            | (Loading, Ready)
            | (Ready, Listening)
            | (Listening, ShuttingDown) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == LifecycleState::Stopped
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Outcome of the loading phase. Load errors are diagnostics, never fatal.
#[derive(Debug, Default)]
pub struct StartupReport {
    /// Registered tools in registration order.
    pub tools: Vec<(String, ToolOrigin)>,
    pub errors: Vec<LoadError>,
}

impl StartupReport {
    /// Log the available tools and every unit that failed to load.
    pub fn log(&self) {
        info!("Available tools:");
        for (name, origin) in &self.tools {
            info!("  - {} (from {})", name, origin);
        }
        if !self.errors.is_empty() {
            warn!("{} tool unit(s) failed to load:", self.errors.len());
            for err in &self.errors {
                warn!("  [{}] {}", err.kind(), err);
            }
        }
    }
}

/// Orchestrates loading, serving and shutdown.
pub struct LifecycleController {
    config: Arc<Config>,
    state: watch::Sender<LifecycleState>,
    compiled: Vec<ToolDescriptor>,
    server: Option<McpServer>,
}

impl LifecycleController {
    pub fn new(config: Config) -> Self {
        let (state, _) = watch::channel(LifecycleState::Uninitialized);
        Self {
            config: Arc::new(config),
            state,
            compiled: Vec::new(),
            server: None,
        }
    }

    /// Add a tool implemented in Rust. Registered after the built-ins and
    /// before any loaded manifest.
    pub fn with_tool(mut self, tool: ToolDescriptor) -> Self {
        self.compiled.push(tool);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Watch state changes, including after the controller is gone.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    fn transition(&self, next: LifecycleState) -> Result<()> {
        let from = self.state();
        if !from.can_transition_to(next) {
            return Err(Error::Lifecycle { from, to: next });
        }
        info!("Lifecycle: {} -> {}", from, next);
        self.state.send_replace(next);
        Ok(())
    }

    /// Build and freeze the registry.
    ///
    /// Built-ins first, then compiled tools, then every configured path in
    /// order. A tool the registry refuses is reported, never fatal.
    pub fn load(&mut self) -> Result<StartupReport> {
        self.transition(LifecycleState::Loading)?;

        let mut registry = ToolRegistry::with_builtins();
        let mut errors = Vec::new();

        let loaded = ToolLoader::new().load_paths(&self.config.tools.paths);
        errors.extend(loaded.errors);

        for tool in self.compiled.drain(..).chain(loaded.tools) {
            let origin = tool.origin().clone();
            if let Err(source) = registry.register(tool) {
                warn!("Rejected tool from {}: {}", origin, source);
                errors.push(LoadError::Rejected { origin, source });
            }
        }

        let tools = registry
            .descriptors()
            .map(|tool| (tool.name().to_string(), tool.origin().clone()))
            .collect();

        self.transition(LifecycleState::Ready)?;
        self.server = Some(McpServer::new(self.config.clone(), registry.freeze()));

        Ok(StartupReport { tools, errors })
    }

    /// Run the server until the transport ends or `shutdown_signal` resolves.
    ///
    /// Loads tools first if [`load`](Self::load) has not been called. A
    /// bind failure moves straight to `Stopped` and is returned.
    pub async fn run<F>(mut self, shutdown_signal: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        if self.state() == LifecycleState::Uninitialized {
            self.load()?.log();
        }
        let Some(server) = self.server.take() else {
            self.transition(LifecycleState::Stopped)?;
            return Err(Error::internal("server is not ready to run"));
        };

        let bound = match TransportService::new(self.config.transport.clone()).bind().await {
            Ok(bound) => bound,
            Err(e) => {
                error!("{}", e);
                self.transition(LifecycleState::Stopped)?;
                return Err(e.into());
            }
        };

        self.transition(LifecycleState::Listening)?;
        info!("Listening ({})", bound.description());

        let token = CancellationToken::new();
        let serve = bound.serve(server, token.clone());
        tokio::pin!(serve);

        let outcome = tokio::select! {
            result = &mut serve => result,
            () = shutdown_signal => {
                info!("Shutdown signal received, draining in-flight requests");
                self.transition(LifecycleState::ShuttingDown)?;
                token.cancel();
                serve.await
            }
        };

        if self.state() == LifecycleState::Listening {
            self.transition(LifecycleState::ShuttingDown)?;
        }
        self.transition(LifecycleState::Stopped)?;
        outcome.map_err(Error::from)
    }
}
