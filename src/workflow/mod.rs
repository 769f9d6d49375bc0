//! Workflow plugin-node execution
//!
//! [`context`] carries run state and resolves `${...}` mappings, [`node`]
//! defines the node configuration and result shapes, and [`executor`] runs
//! one node with retries, cancellation, and context write-back.

pub mod context;
pub mod executor;
pub mod node;

pub use context::WorkflowContext;
pub use executor::{CancelHandle, CancelSignal, NodeExecutor, cancel_pair};
pub use node::{PluginNodeConfig, PluginNodeResult, error_code};
