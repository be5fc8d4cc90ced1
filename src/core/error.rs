//! Error types and handling for the MCP server.
//!
//! This module defines a unified error type for the failures that can reach
//! the top of the process. Tool and load errors are normally recovered into
//! responses or diagnostics long before they get here.

use thiserror::Error;

use super::lifecycle::LifecycleState;
use super::transport::TransportError;

/// A specialized Result type for MCP server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the MCP server.
#[derive(Debug, Error)]
pub enum Error {
    /// Error originating from the transport layer. Bind failures are fatal.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The lifecycle controller was asked for a transition it does not allow.
    #[error("Invalid lifecycle transition from {from:?} to {to:?}")]
    Lifecycle {
        from: LifecycleState,
        to: LifecycleState,
    },

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server errors that should not occur under normal operation.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
