//! Invocation Dispatcher - resolves a tool and runs it.
//!
//! Every failure mode ends up as a [`ToolError`]: unknown names, argument
//! mismatches, handler errors and handler panics. Nothing raised by a tool
//! escapes into the transport.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::descriptor::Arguments;
use super::error::ToolError;
use super::registry::ToolRegistry;

/// Dispatches invocations against a frozen registry.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
}

impl Dispatcher {
    /// Create a dispatcher over a frozen registry.
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Invoke the named tool with the given arguments.
    ///
    /// Tools are never retried; whatever the handler returns is final.
    #[instrument(skip(self, arguments))]
    pub async fn invoke(&self, name: &str, arguments: Arguments) -> Result<Value, ToolError> {
        let tool = self.registry.resolve(name).inspect_err(|e| warn!("{}", e))?;
        tool.signature()
            .validate(name, &arguments)
            .inspect_err(|e| warn!("{}", e))?;

        info!("Calling tool '{}'", name);
        let logged = Value::Object(arguments.clone());
        debug!(arguments = %logged, "Tool call parameters");

        let outcome = AssertUnwindSafe(tool.handler().call(arguments))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(value)) => {
                debug!(result = %value, "Tool '{}' returned", name);
                Ok(value)
            }
            Ok(Err(e)) => {
                warn!("Tool '{}' failed: {:#}", name, e);
                Err(ToolError::execution_failed(name, format!("{e:#}")))
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!("Tool '{}' panicked: {}", name, message);
                Err(ToolError::execution_failed(name, message))
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "tool panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::descriptor::{
        ParamType, Parameter, Signature, ToolDescriptor, ToolHandler, ToolOrigin,
    };
    use async_trait::async_trait;
    use serde_json::json;

    struct Greet;

    #[async_trait]
    impl ToolHandler for Greet {
        async fn call(&self, arguments: Arguments) -> anyhow::Result<Value> {
            let name = arguments["name"].as_str().unwrap_or_default();
            if name == "nobody" {
                anyhow::bail!("refusing to greet nobody");
            }
            Ok(json!(format!("hello {name}")))
        }
    }

    struct Explode;

    #[async_trait]
    impl ToolHandler for Explode {
        async fn call(&self, _arguments: Arguments) -> anyhow::Result<Value> {
            panic!("boom");
        }
    }

    fn dispatcher() -> Dispatcher {
        let mut registry = ToolRegistry::with_builtins();
        registry
            .register(ToolDescriptor::new(
                "greet",
                Signature::new(vec![Parameter::required("name", ParamType::String)]),
                ToolOrigin::Compiled,
                Greet,
            ))
            .unwrap();
        registry
            .register(ToolDescriptor::new(
                "explode",
                Signature::default(),
                ToolOrigin::Compiled,
                Explode,
            ))
            .unwrap();
        Dispatcher::new(registry.freeze())
    }

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_invoke_success() {
        let result = dispatcher()
            .invoke("greet", args(json!({"name": "ada"})))
            .await
            .unwrap();
        assert_eq!(result, json!("hello ada"));
    }

    #[tokio::test]
    async fn test_invoke_echo_and_health() {
        let d = dispatcher();
        let payload = args(json!({"x": 1, "y": ["a", null]}));
        let echoed = d.invoke("echo", payload.clone()).await.unwrap();
        assert_eq!(echoed, Value::Object(payload));

        let health = d.invoke("health", Arguments::new()).await.unwrap();
        assert_eq!(health, json!("ready"));
    }

    #[tokio::test]
    async fn test_invoke_unknown_tool() {
        let err = dispatcher()
            .invoke("nope", Arguments::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "UnknownTool");
    }

    #[tokio::test]
    async fn test_invoke_invalid_arguments() {
        let d = dispatcher();
        let missing = d.invoke("greet", Arguments::new()).await.unwrap_err();
        assert_eq!(missing.kind(), "InvalidArguments");

        let extra = d
            .invoke("greet", args(json!({"name": "ada", "loud": true})))
            .await
            .unwrap_err();
        assert_eq!(extra.kind(), "InvalidArguments");

        let health = d
            .invoke("health", args(json!({"verbose": true})))
            .await
            .unwrap_err();
        assert_eq!(health.kind(), "InvalidArguments");
    }

    #[tokio::test]
    async fn test_handler_error_carries_message() {
        let err = dispatcher()
            .invoke("greet", args(json!({"name": "nobody"})))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "ToolExecutionError");
        assert!(err.to_string().contains("refusing to greet nobody"));
    }

    #[tokio::test]
    async fn test_handler_panic_is_captured() {
        let d = dispatcher();
        let err = d.invoke("explode", Arguments::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { ref message, .. } if message == "boom"));

        // The dispatcher is still usable afterwards.
        assert!(d.invoke("health", Arguments::new()).await.is_ok());
    }

    #[tokio::test]
    async fn test_invoke_with_debug_logging_enabled() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let result = dispatcher()
            .invoke("echo", args(json!({"nested": {"a": [1, 2]}})))
            .await
            .unwrap();
        assert_eq!(result, json!({"nested": {"a": [1, 2]}}));
    }
}
