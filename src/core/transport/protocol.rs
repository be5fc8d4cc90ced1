//! Wire envelope shared by every transport.
//!
//! Requests are JSON-RPC 2.0 shaped objects. A `method` that is not one of
//! the protocol methods below is taken to be a tool name, with `params` as
//! its argument object:
//!
//! - `initialize` - server name, version and capabilities
//! - `ping` - empty result
//! - `tools/list` - registered tools with their input schemas
//! - `tools/call` - `{ name, arguments }` form of a tool call
//! - `notifications/*` - accepted, never answered

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use crate::core::McpServer;
use crate::domains::tools::{ToolError, codes};

/// MCP protocol revision reported by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC request structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// JSON-RPC response structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcRequest {
    /// Notifications get no response.
    pub fn is_notification(&self) -> bool {
        self.method.starts_with("notifications/")
    }
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(
        id: Option<Value>,
        code: i32,
        message: impl Into<String>,
        kind: &'static str,
    ) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: Some(json!({ "kind": kind })),
            }),
        }
    }

    /// Create an error response from a tool error.
    pub fn tool_error(id: Option<Value>, err: &ToolError) -> Self {
        let mut response = Self::error(id, err.code(), err.to_string(), err.kind());
        if let (Some(error), ToolError::ExecutionFailed { tool, message }) =
            (response.error.as_mut(), err)
        {
            error.data = Some(json!({
                "kind": err.kind(),
                "tool": tool,
                "detail": message,
            }));
        }
        response
    }

    /// Parse error (unreadable JSON).
    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::error(None, codes::PARSE_ERROR, msg, "ParseError")
    }

    /// Invalid request error.
    pub fn invalid_request(id: Option<Value>, msg: impl Into<String>) -> Self {
        Self::error(id, codes::INVALID_REQUEST, msg, "InvalidRequest")
    }
}

/// Parse one encoded request.
///
/// On failure the returned response is the error to send back.
pub fn parse_request(text: &str) -> Result<JsonRpcRequest, Box<JsonRpcResponse>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| Box::new(JsonRpcResponse::parse_error(format!("Parse error: {e}"))))?;

    let id = value.get("id").cloned();
    let request: JsonRpcRequest = serde_json::from_value(value).map_err(|e| {
        Box::new(JsonRpcResponse::invalid_request(
            id.clone(),
            format!("Invalid request: {e}"),
        ))
    })?;

    if request.jsonrpc.as_deref().is_some_and(|v| v != "2.0") {
        return Err(Box::new(JsonRpcResponse::invalid_request(
            id,
            "Unsupported jsonrpc version",
        )));
    }
    Ok(request)
}

/// Parse and process one line of the duplex protocol.
pub async fn process_line(server: &McpServer, line: &str) -> Option<JsonRpcResponse> {
    match parse_request(line) {
        Ok(request) => process_request(server, request).await,
        Err(response) => {
            warn!("Rejected request: {:?}", response.error);
            Some(*response)
        }
    }
}

/// Process a request and return the response, if one is due.
#[instrument(skip_all, fields(method = %request.method))]
pub async fn process_request(
    server: &McpServer,
    request: JsonRpcRequest,
) -> Option<JsonRpcResponse> {
    if request.is_notification() {
        debug!("Received notification: {}", request.method);
        return None;
    }

    let JsonRpcRequest {
        id, method, params, ..
    } = request;

    let response = match method.as_str() {
        "initialize" => {
            info!("Processing initialize request");
            JsonRpcResponse::success(id, server.server_info())
        }

        "ping" => JsonRpcResponse::success(id, json!({})),

        "tools/list" => JsonRpcResponse::success(id, json!({ "tools": server.list_tools() })),

        "tools/call" => handle_tools_call(server, id, params).await,

        name => match server.call_tool(name, params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => JsonRpcResponse::tool_error(id, &e),
        },
    };

    Some(response)
}

/// Handle the `{ name, arguments }` form used by MCP clients.
async fn handle_tools_call(
    server: &McpServer,
    id: Option<Value>,
    params: Option<Value>,
) -> JsonRpcResponse {
    let params = params.unwrap_or(Value::Null);
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return JsonRpcResponse::error(
            id,
            codes::INVALID_ARGUMENTS,
            "Missing tool name",
            "InvalidArguments",
        );
    };
    let arguments = params.get("arguments").cloned();

    match server.call_tool(name, arguments).await {
        Ok(result) => JsonRpcResponse::success(id, call_tool_result(result)),
        Err(e) => JsonRpcResponse::tool_error(id, &e),
    }
}

/// Wrap a tool payload in the MCP `CallToolResult` shape.
fn call_tool_result(result: Value) -> Value {
    let text = match &result {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    json!({
        "content": [{ "type": "text", "text": text }],
        "structuredContent": result,
        "isError": false,
    })
}
