//! Transport service - orchestrates different transport types.
//!
//! Binding and serving are separate steps so that a bind failure can be
//! reported before the server is considered to be listening.

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::stdio::StdioTransport;
use super::{TransportConfig, TransportResult};
use crate::core::McpServer;

#[cfg(feature = "sse")]
use super::sse::{SseListener, SseTransport};

/// Transport service - manages the transport layer for the MCP server.
pub struct TransportService {
    config: TransportConfig,
}

/// A transport that is ready to accept traffic.
pub enum BoundTransport {
    Stdio,
    #[cfg(feature = "sse")]
    Sse(SseListener),
}

impl TransportService {
    /// Create a new transport service with the given configuration.
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    /// Get the transport configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Acquire whatever the transport needs before traffic can flow.
    pub async fn bind(self) -> TransportResult<BoundTransport> {
        info!("Starting transport: {}", self.config.description());

        match self.config {
            TransportConfig::Stdio => Ok(BoundTransport::Stdio),
            #[cfg(feature = "sse")]
            TransportConfig::Sse(cfg) => {
                let listener = SseTransport::new(cfg).bind().await?;
                Ok(BoundTransport::Sse(listener))
            }
        }
    }
}

impl BoundTransport {
    pub fn description(&self) -> String {
        match self {
            Self::Stdio => "stdio".to_string(),
            #[cfg(feature = "sse")]
            Self::Sse(listener) => format!("sse on {}", listener.local_addr()),
        }
    }

    /// Serve requests until the transport ends or `shutdown` fires.
    ///
    /// Returns once in-flight invocations have been answered.
    pub async fn serve(
        self,
        server: McpServer,
        shutdown: CancellationToken,
    ) -> TransportResult<()> {
        match self {
            Self::Stdio => StdioTransport::run(server, shutdown).await,
            #[cfg(feature = "sse")]
            Self::Sse(listener) => listener.serve(server, shutdown).await,
        }
    }
}
