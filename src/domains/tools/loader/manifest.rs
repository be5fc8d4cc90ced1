//! Tool manifest types.
//!
//! A manifest is a JSON file declaring the tools it provides. The loader
//! requires exactly one entry in `tools`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domains::tools::descriptor::Parameter;

/// Top-level manifest document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolManifest {
    /// Tools declared by this manifest.
    #[serde(default)]
    pub tools: Vec<ToolDef>,
}

/// One declared tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolDef {
    /// Tool name as exposed to clients.
    pub name: String,

    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Ordered parameter list.
    #[serde(default)]
    pub parameters: Vec<Parameter>,

    /// Program and arguments that implement the tool.
    pub command: Vec<String>,

    /// Extra environment variables for the spawned program.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl ToolManifest {
    /// Names of all declared tools, in declaration order.
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::descriptor::ParamType;
    use serde_json::json;

    #[test]
    fn test_deserialize_full_manifest() {
        let manifest: ToolManifest = serde_json::from_value(json!({
            "tools": [{
                "name": "fetch_weather",
                "description": "Current weather for a city",
                "parameters": [
                    {"name": "city", "type": "string"},
                    {"name": "units", "type": "string", "required": false}
                ],
                "command": ["./fetch_weather.sh", "--json"],
                "env": {"WEATHER_UNITS": "metric"}
            }]
        }))
        .unwrap();

        let tool = &manifest.tools[0];
        assert_eq!(tool.name, "fetch_weather");
        assert_eq!(tool.parameters.len(), 2);
        assert_eq!(tool.parameters[0].kind, ParamType::String);
        assert!(!tool.parameters[1].required);
        assert_eq!(tool.command, vec!["./fetch_weather.sh", "--json"]);
        assert_eq!(tool.env["WEATHER_UNITS"], "metric");
    }

    #[test]
    fn test_missing_tools_is_empty() {
        let manifest: ToolManifest = serde_json::from_value(json!({})).unwrap();
        assert!(manifest.tools.is_empty());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<ToolManifest, _> = serde_json::from_value(json!({
            "tools": [{"name": "x", "command": ["true"], "cmd": "oops"}]
        }));
        assert!(result.is_err());
    }
}
