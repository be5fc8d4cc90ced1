//! Tools domain module.
//!
//! This module handles everything between a tool manifest on disk and a
//! finished invocation.
//!
//! ## Architecture
//!
//! - `descriptor.rs` - Tool descriptors, signatures and the handler trait
//! - `builtins.rs` - `echo` and `health`
//! - `loader/` - Manifest discovery and isolated import
//! - `registry.rs` - Name to descriptor mapping, frozen before serving
//! - `dispatcher.rs` - Resolution, argument validation and execution
//! - `error.rs` - Tool and load error types
//!
//! ## Adding a compiled-in tool
//!
//! Implement [`ToolHandler`], wrap it in a [`ToolDescriptor`] and hand it to
//! the lifecycle controller before the server starts loading.

mod builtins;
mod descriptor;
mod dispatcher;
mod error;
pub mod loader;
mod registry;

pub use builtins::{EchoTool, HealthTool, builtin_tools};
pub use descriptor::{
    Arguments, ParamType, Parameter, Signature, ToolDescriptor, ToolHandler, ToolOrigin,
};
pub use dispatcher::Dispatcher;
pub use error::{LoadError, ToolError, codes};
pub use loader::{LoadReport, ToolLoader};
pub use registry::ToolRegistry;
