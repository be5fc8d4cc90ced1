//! Tool descriptors - the immutable record of one invocable tool.
//!
//! A descriptor bundles the tool name, its parameter signature, where it came
//! from, and the handler that actually runs it. Handlers are reached only
//! through the [`Dispatcher`](super::Dispatcher).

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::error::ToolError;

/// Arguments passed to a tool: parameter name to JSON value.
pub type Arguments = Map<String, Value>;

/// Trait implemented by everything that can back a tool.
///
/// Built-in tools, compiled-in tools and manifest-declared commands all go
/// through this one contract. Failures are opaque to the runtime; the
/// dispatcher reports them as `ToolExecutionError` with the handler's message.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool with already-validated arguments.
    async fn call(&self, arguments: Arguments) -> anyhow::Result<Value>;
}

/// Declared type of a tool parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    #[default]
    Any,
}

impl ParamType {
    /// Check whether a JSON value is acceptable for this type.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::Any => true,
        }
    }

    fn schema_name(self) -> Option<&'static str> {
        match self {
            Self::String => Some("string"),
            Self::Integer => Some("integer"),
            Self::Number => Some("number"),
            Self::Boolean => Some("boolean"),
            Self::Array => Some("array"),
            Self::Object => Some("object"),
            Self::Any => None,
        }
    }
}

/// One declared parameter of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: ParamType,

    #[serde(default = "default_required")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_required() -> bool {
    true
}

impl Parameter {
    /// A required parameter of the given type.
    pub fn required(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            description: None,
        }
    }

    /// An optional parameter of the given type.
    pub fn optional(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind)
        }
    }
}

/// Ordered parameter list of a tool.
///
/// A closed signature rejects arguments it does not declare. An open one
/// (used by `echo`) accepts anything beyond the declared parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    params: Vec<Parameter>,
    open: bool,
}

impl Signature {
    /// A closed signature over the given parameters.
    pub fn new(params: Vec<Parameter>) -> Self {
        Self {
            params,
            open: false,
        }
    }

    /// A signature that accepts arbitrary arguments.
    pub fn open() -> Self {
        Self {
            params: Vec::new(),
            open: true,
        }
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Validate supplied arguments for the named tool.
    ///
    /// Missing required parameters, undeclared extras (on closed signatures)
    /// and type mismatches all yield `InvalidArguments`. An explicit `null`
    /// for an optional parameter is treated as absent.
    pub fn validate(&self, tool: &str, arguments: &Arguments) -> Result<(), ToolError> {
        for param in &self.params {
            match arguments.get(&param.name) {
                None | Some(Value::Null) if param.required => {
                    return Err(ToolError::invalid_arguments(
                        tool,
                        format!("missing required parameter '{}'", param.name),
                    ));
                }
                None | Some(Value::Null) => {}
                Some(value) if !param.kind.accepts(value) => {
                    return Err(ToolError::invalid_arguments(
                        tool,
                        format!(
                            "parameter '{}' expects {:?}, got {}",
                            param.name,
                            param.kind,
                            value_kind(value)
                        ),
                    ));
                }
                Some(_) => {}
            }
        }

        if !self.open {
            let mut unexpected: Vec<&str> = arguments
                .keys()
                .filter(|key| !self.params.iter().any(|p| &p.name == *key))
                .map(String::as_str)
                .collect();
            if !unexpected.is_empty() {
                unexpected.sort_unstable();
                return Err(ToolError::invalid_arguments(
                    tool,
                    format!("unexpected parameter(s): {}", unexpected.join(", ")),
                ));
            }
        }

        Ok(())
    }

    /// JSON Schema describing the argument object, as listed by `tools/list`.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.params {
            let mut schema = Map::new();
            if let Some(name) = param.kind.schema_name() {
                schema.insert("type".to_string(), json!(name));
            }
            if let Some(description) = &param.description {
                schema.insert("description".to_string(), json!(description));
            }
            properties.insert(param.name.clone(), Value::Object(schema));
        }

        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": self.open,
        })
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Where a tool came from. Diagnostics only, never consulted for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOrigin {
    BuiltIn,
    Compiled,
    Manifest(PathBuf),
}

impl fmt::Display for ToolOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuiltIn => f.write_str("built-in"),
            Self::Compiled => f.write_str("compiled"),
            Self::Manifest(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Immutable record of one registered tool.
pub struct ToolDescriptor {
    name: String,
    description: Option<String>,
    signature: Signature,
    origin: ToolOrigin,
    handler: Box<dyn ToolHandler>,
}

impl ToolDescriptor {
    /// Create a descriptor. The name is validated when it is registered.
    pub fn new(
        name: impl Into<String>,
        signature: Signature,
        origin: ToolOrigin,
        handler: impl ToolHandler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            signature,
            origin,
            handler: Box::new(handler),
        }
    }

    /// Attach a human-readable description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn origin(&self) -> &ToolOrigin {
        &self.origin
    }

    pub(crate) fn handler(&self) -> &dyn ToolHandler {
        self.handler.as_ref()
    }

    /// Tool metadata in the shape returned by `tools/list`.
    pub fn to_listing(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.signature.input_schema(),
        })
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> Arguments {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn weather_signature() -> Signature {
        Signature::new(vec![
            Parameter::required("city", ParamType::String),
            Parameter::optional("days", ParamType::Integer),
        ])
    }

    #[test]
    fn test_validate_accepts_declared_arguments() {
        let sig = weather_signature();
        assert!(sig.validate("weather", &args(json!({"city": "Oslo"}))).is_ok());
        assert!(
            sig.validate("weather", &args(json!({"city": "Oslo", "days": 3})))
                .is_ok()
        );
        assert!(
            sig.validate("weather", &args(json!({"city": "Oslo", "days": null})))
                .is_ok()
        );
    }

    #[test]
    fn test_validate_missing_required() {
        let err = weather_signature()
            .validate("weather", &args(json!({"days": 2})))
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidArguments");
        assert!(err.to_string().contains("'city'"));
    }

    #[test]
    fn test_validate_rejects_extras() {
        let err = weather_signature()
            .validate("weather", &args(json!({"city": "Oslo", "zip": "0150"})))
            .unwrap_err();
        assert!(err.to_string().contains("zip"));
    }

    #[test]
    fn test_validate_type_mismatch() {
        let err = weather_signature()
            .validate("weather", &args(json!({"city": 42})))
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[test]
    fn test_open_signature_accepts_anything() {
        let sig = Signature::open();
        assert!(sig.validate("echo", &args(json!({"a": 1, "b": [2]}))).is_ok());
    }

    #[test]
    fn test_input_schema() {
        let schema = weather_signature().input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["city"]["type"], "string");
        assert_eq!(schema["required"], json!(["city"]));
        assert_eq!(schema["additionalProperties"], false);
    }

    #[test]
    fn test_parameter_defaults_from_json() {
        let param: Parameter = serde_json::from_value(json!({"name": "q"})).unwrap();
        assert!(param.required);
        assert_eq!(param.kind, ParamType::Any);
    }
}
