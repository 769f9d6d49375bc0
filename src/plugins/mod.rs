//! Plugin model and registry
//!
//! Plugins are externally registered collections of HTTP operations. The
//! gateway consumes them read-only through the [`PluginRegistry`] contract.

pub mod descriptor;
pub mod registry;

pub use descriptor::{AuthDescriptor, HttpMethod, OperationDescriptor, PluginRecord};
pub use registry::{InMemoryPluginRegistry, PluginRegistry};
