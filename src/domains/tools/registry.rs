//! Tool Registry - name to descriptor mapping with a uniqueness contract.
//!
//! The registry is mutable only while the server is loading. Freezing it
//! moves it behind an `Arc`, after which every connection shares it
//! read-only and no invocation needs a lock.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::builtins::builtin_tools;
use super::descriptor::ToolDescriptor;
use super::error::ToolError;

/// Names owned by the wire protocol; a tool may not shadow them.
const RESERVED_NAMES: &[&str] = &["initialize", "ping"];

/// Tool registry - manages all available tools.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with the built-in tools.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for tool in builtin_tools() {
            // Built-in names are constants and never collide with each other.
            if let Err(e) = registry.register(tool) {
                debug!("Skipping built-in tool: {}", e);
            }
        }
        registry
    }

    /// Insert a descriptor.
    ///
    /// Fails with `DuplicateName` when the name is taken (or reserved by the
    /// protocol) and with `InvalidName` when it is empty or malformed. The
    /// existing entry is never replaced.
    pub fn register(&mut self, tool: ToolDescriptor) -> Result<(), ToolError> {
        let name = tool.name();
        if !is_valid_name(name) {
            return Err(ToolError::InvalidName(name.to_string()));
        }
        if RESERVED_NAMES.contains(&name) {
            return Err(ToolError::DuplicateName {
                name: name.to_string(),
                existing: "reserved protocol method".to_string(),
            });
        }
        if let Some(&existing) = self.index.get(name) {
            return Err(ToolError::DuplicateName {
                name: name.to_string(),
                existing: format!("from {}", self.tools[existing].origin()),
            });
        }

        debug!("Registered tool '{}' from {}", name, tool.origin());
        self.index.insert(name.to_string(), self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Look up a tool by name.
    pub fn resolve(&self, name: &str) -> Result<&ToolDescriptor, ToolError> {
        self.index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    /// Registered names in registration order.
    ///
    /// The iterator is lazy; clone it (or call `list` again) to restart.
    pub fn list(&self) -> impl Iterator<Item = &str> + Clone + '_ {
        self.tools.iter().map(ToolDescriptor::name)
    }

    /// Registered descriptors in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> + '_ {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Freeze the registry for shared read-only use.
    pub fn freeze(self) -> Arc<Self> {
        Arc::new(self)
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
