//! MCP server handler.
//!
//! `McpServer` is what every transport talks to. It owns the frozen tool
//! registry through the dispatcher and answers the protocol-level requests
//! (`initialize`, `tools/list`) itself. Cloning is cheap; all clones share
//! one registry.

use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::instrument;

use super::config::Config;
use super::transport::PROTOCOL_VERSION;
use crate::domains::tools::{Dispatcher, ToolError, ToolRegistry};

/// The main MCP server handler.
#[derive(Debug, Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Dispatches tool calls against the frozen registry.
    dispatcher: Dispatcher,
}

impl McpServer {
    /// Create a server over a registry that will no longer change.
    pub fn new(config: Arc<Config>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            config,
            dispatcher: Dispatcher::new(registry),
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn registry(&self) -> &ToolRegistry {
        self.dispatcher.registry()
    }

    /// Result of the `initialize` handshake.
    pub fn server_info(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": self.name(),
                "version": self.version()
            },
            "instructions": "Call any listed tool by name with its arguments as params."
        })
    }

    /// Listing entries for every registered tool, in registration order.
    pub fn list_tools(&self) -> Vec<Value> {
        self.registry()
            .descriptors()
            .map(|tool| tool.to_listing())
            .collect()
    }

    /// Call a tool by name.
    ///
    /// Absent or `null` arguments mean an empty argument mapping; anything
    /// other than an object is rejected.
    #[instrument(skip(self, arguments))]
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Value>,
    ) -> Result<Value, ToolError> {
        let arguments = match arguments {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(ToolError::invalid_arguments(
                    name,
                    format!("arguments must be an object, got {}", json_type(&other)),
                ));
            }
        };
        self.dispatcher.invoke(name, arguments).await
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
