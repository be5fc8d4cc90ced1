//! Built-in tools registered before anything is loaded from disk.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use super::descriptor::{Arguments, Signature, ToolDescriptor, ToolHandler, ToolOrigin};

/// Echo tool - returns its invocation arguments unchanged.
pub struct EchoTool;

impl EchoTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "echo";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Echoes back the invocation parameters.";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Signature::open(), ToolOrigin::BuiltIn, Self)
            .with_description(Self::DESCRIPTION)
    }
}

#[async_trait]
impl ToolHandler for EchoTool {
    async fn call(&self, arguments: Arguments) -> anyhow::Result<Value> {
        debug!("Echo tool called with {} argument(s)", arguments.len());
        Ok(Value::Object(arguments))
    }
}

/// Health tool - reports a fixed ready status.
pub struct HealthTool;

impl HealthTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "health";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Reports the server's health status.";

    /// Status returned on every call.
    pub const STATUS: &'static str = "ready";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Signature::default(),
            ToolOrigin::BuiltIn,
            Self,
        )
        .with_description(Self::DESCRIPTION)
    }
}

#[async_trait]
impl ToolHandler for HealthTool {
    async fn call(&self, _arguments: Arguments) -> anyhow::Result<Value> {
        Ok(json!(Self::STATUS))
    }
}

/// All built-in tools, in registration order.
pub fn builtin_tools() -> Vec<ToolDescriptor> {
    vec![EchoTool::descriptor(), HealthTool::descriptor()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_returns_arguments() {
        let mut args = Arguments::new();
        args.insert("text".to_string(), json!("hello"));
        args.insert("nested".to_string(), json!({"n": [1, 2, 3]}));

        let result = EchoTool.call(args.clone()).await.unwrap();
        assert_eq!(result, Value::Object(args));
    }

    #[tokio::test]
    async fn test_health_is_ready() {
        let result = HealthTool.call(Arguments::new()).await.unwrap();
        assert_eq!(result, json!("ready"));
    }

    #[test]
    fn test_builtin_order() {
        let names: Vec<_> = builtin_tools()
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(names, vec!["echo", "health"]);
    }
}
