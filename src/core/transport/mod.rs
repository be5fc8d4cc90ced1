//! Transport layer for the MCP server.
//!
//! This module provides two transport implementations:
//! - **STDIO**: line-delimited JSON over standard input/output (always built)
//! - **SSE**: HTTP server-sent event stream plus a POST endpoint - feature: `sse`
//!
//! Both are framing only. Every request goes through [`protocol`] to the
//! same server handler.

mod config;
mod connection;
mod error;
mod service;

pub mod protocol;
pub mod stdio;

#[cfg(feature = "sse")]
pub mod sse;

pub use config::{DEFAULT_SSE_PORT, TransportConfig};
pub use connection::{Connection, ConnectionState};
pub use error::{TransportError, TransportResult};
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION};
pub use service::{BoundTransport, TransportService};

#[cfg(feature = "sse")]
pub use config::SseConfig;
