//! Tool-specific error types.
//!
//! [`ToolError`] covers registration and invocation failures and is what the
//! transports turn into error envelopes. [`LoadError`] covers everything that
//! can go wrong while turning a manifest file into a descriptor; those are
//! collected into the startup diagnostic and never abort the server.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::descriptor::ToolOrigin;

/// JSON-RPC error codes used for tool errors.
pub mod codes {
    /// Invalid JSON was received.
    pub const PARSE_ERROR: i32 = -32700;
    /// The envelope is not a valid request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// The requested tool (or method) does not exist.
    pub const UNKNOWN_TOOL: i32 = -32601;
    /// Arguments did not match the tool signature.
    pub const INVALID_ARGUMENTS: i32 = -32602;
    /// Internal server error.
    pub const INTERNAL_ERROR: i32 = -32603;
    /// The tool ran and reported a failure.
    pub const TOOL_EXECUTION_ERROR: i32 = -32000;
}

/// Errors that can occur during tool registration and invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The tool name is empty or contains characters outside `[A-Za-z0-9_.-]`.
    #[error("Invalid tool name '{0}'")]
    InvalidName(String),

    /// A tool with the same name is already registered.
    #[error("Tool '{name}' is already registered ({existing})")]
    DuplicateName { name: String, existing: String },

    /// The requested tool was not found.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Invalid arguments were provided to the tool.
    #[error("Invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// The tool execution failed.
    #[error("Tool '{tool}' failed: {message}")]
    ExecutionFailed { tool: String, message: String },
}

impl ToolError {
    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Create a new "execution failed" error.
    pub fn execution_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Stable kind tag reported in the `data.kind` field of error envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidName(_) => "InvalidName",
            Self::DuplicateName { .. } => "DuplicateName",
            Self::UnknownTool(_) => "UnknownTool",
            Self::InvalidArguments { .. } => "InvalidArguments",
            Self::ExecutionFailed { .. } => "ToolExecutionError",
        }
    }

    /// JSON-RPC error code for this error.
    pub fn code(&self) -> i32 {
        match self {
            Self::UnknownTool(_) => codes::UNKNOWN_TOOL,
            Self::InvalidArguments { .. } => codes::INVALID_ARGUMENTS,
            Self::ExecutionFailed { .. } => codes::TOOL_EXECUTION_ERROR,
            Self::InvalidName(_) | Self::DuplicateName { .. } => codes::INTERNAL_ERROR,
        }
    }
}

/// Per-unit failures reported by the tool loader.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The manifest declares no tool.
    #[error("{}: no tool declared", .path.display())]
    NoToolFound { path: PathBuf },

    /// The manifest declares more than one tool.
    #[error("{}: multiple tools declared ({}); exactly one is allowed", .path.display(), .names.join(", "))]
    AmbiguousTool { path: PathBuf, names: Vec<String> },

    /// The manifest could not be read, parsed or resolved.
    #[error("{}: import failed: {reason}", .path.display())]
    ImportFailure { path: PathBuf, reason: String },

    /// The tool was extracted but the registry refused it.
    #[error("{origin}: {source}")]
    Rejected {
        origin: ToolOrigin,
        #[source]
        source: ToolError,
    },
}

impl LoadError {
    /// Create an import failure for the given path.
    pub fn import(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::ImportFailure {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Stable kind tag used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoToolFound { .. } => "NoToolFound",
            Self::AmbiguousTool { .. } => "AmbiguousTool",
            Self::ImportFailure { .. } => "ImportFailure",
            Self::Rejected { source, .. } => source.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_error_keeps_tool_message() {
        let err = ToolError::execution_failed("weather", "city not found");
        assert_eq!(err.kind(), "ToolExecutionError");
        assert_eq!(err.code(), codes::TOOL_EXECUTION_ERROR);
        assert!(err.to_string().contains("city not found"));
    }

    #[test]
    fn test_rejected_reports_registry_kind() {
        let err = LoadError::Rejected {
            origin: ToolOrigin::Manifest(PathBuf::from("/tools/echo.json")),
            source: ToolError::DuplicateName {
                name: "echo".to_string(),
                existing: "from built-in".to_string(),
            },
        };
        assert_eq!(err.kind(), "DuplicateName");
        assert!(err.to_string().starts_with("/tools/echo.json"));
    }

    #[test]
    fn test_ambiguous_lists_names() {
        let err = LoadError::AmbiguousTool {
            path: PathBuf::from("two.json"),
            names: vec!["a".to_string(), "b".to_string()],
        };
        assert!(err.to_string().contains("a, b"));
    }
}
