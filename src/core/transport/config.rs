//! Transport configuration types.

use serde::{Deserialize, Serialize};

/// Default port of the SSE transport.
pub const DEFAULT_SSE_PORT: u16 = 8080;

/// Transport configuration options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Line-delimited JSON over standard input/output (default for MCP).
    #[default]
    Stdio,

    /// JSON-RPC over an HTTP server-sent event stream.
    #[cfg(feature = "sse")]
    Sse(SseConfig),
}

/// SSE transport configuration.
#[cfg(feature = "sse")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SseConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Path clients subscribe to.
    #[serde(default = "default_sse_path")]
    pub sse_path: String,

    /// Path clients post requests to.
    #[serde(default = "default_message_path")]
    pub message_path: String,

    /// Enable CORS for browser clients.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,
}

#[cfg(feature = "sse")]
fn default_host() -> String {
    "0.0.0.0".to_string()
}

#[cfg(feature = "sse")]
fn default_sse_path() -> String {
    "/sse".to_string()
}

#[cfg(feature = "sse")]
fn default_message_path() -> String {
    "/messages".to_string()
}

#[cfg(feature = "sse")]
fn default_cors() -> bool {
    true
}

#[cfg(feature = "sse")]
impl Default for SseConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_SSE_PORT,
            host: default_host(),
            sse_path: default_sse_path(),
            message_path: default_message_path(),
            enable_cors: default_cors(),
        }
    }
}

impl TransportConfig {
    /// Create a STDIO transport config.
    pub fn stdio() -> Self {
        Self::Stdio
    }

    /// Create an SSE transport config on the given port.
    #[cfg(feature = "sse")]
    pub fn sse(port: u16) -> Self {
        Self::Sse(SseConfig {
            port,
            ..Default::default()
        })
    }

    /// Load transport config from environment variables.
    ///
    /// `MCP_TRANSPORT` selects `stdio` (default) or `sse`; `MCP_SSE_PORT`
    /// overrides the SSE port.
    pub fn from_env() -> Self {
        let transport = std::env::var("MCP_TRANSPORT")
            .unwrap_or_default()
            .to_lowercase();

        match transport.as_str() {
            #[cfg(feature = "sse")]
            "sse" => {
                let port = std::env::var("MCP_SSE_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(DEFAULT_SSE_PORT);
                Self::sse(port)
            }
            _ => Self::Stdio,
        }
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self {
            Self::Stdio => "STDIO (standard MCP mode)".to_string(),
            #[cfg(feature = "sse")]
            Self::Sse(cfg) => format!("SSE on http://{}:{}{}", cfg.host, cfg.port, cfg.sse_path),
        }
    }

    /// Check if this transport is the standard STDIO mode.
    pub fn is_stdio(&self) -> bool {
        matches!(self, Self::Stdio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_stdio() {
        assert!(TransportConfig::default().is_stdio());
    }

    #[cfg(feature = "sse")]
    #[test]
    fn test_sse_defaults() {
        let TransportConfig::Sse(cfg) = TransportConfig::sse(9000) else {
            panic!("expected sse config");
        };
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.sse_path, "/sse");
        assert_eq!(
            TransportConfig::Sse(cfg).description(),
            "SSE on http://0.0.0.0:9000/sse"
        );
    }
}
