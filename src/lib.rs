//! Conduit Gateway - Dynamic plugin invocation for assistant and workflow runtimes
//!
//! This library provides the core functionality for the Conduit gateway:
//! - Schema-driven HTTP invocation of registered plugin operations
//! - A deterministic tool catalog with keyword-based query routing
//! - Session entity memory for multi-turn conversations
//! - Workflow plugin nodes with expression mappings, retries, and cancellation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     Callers                          │
//! │   Chat tool matching   │   Workflow node execution  │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │               Operation Gateway                      │
//! │   Registry lookup  │  Request build  │  Invocation  │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Plugin Services                      │
//! │   HTTP endpoints described by operation schemas      │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod invoke;
pub mod plugins;
pub mod tools;
pub mod workflow;

pub use config::{GatewayConfig, InvokeConfig, MatcherConfig, NodeDefaults};
pub use error::{Error, Result};
pub use gateway::OperationGateway;
pub use invoke::{Arguments, BuiltRequest, DEFAULT_TIMEOUT_MS, HttpInvoker, InvocationResult};
pub use plugins::{
    AuthDescriptor, HttpMethod, InMemoryPluginRegistry, OperationDescriptor, PluginRecord,
    PluginRegistry,
};
pub use tools::{
    ChatMessage, EntityKind, MatchOutcome, MatchRule, OperationKind, SessionEntityStore,
    ToolCatalog, ToolDescriptor, ToolKey, ToolMatcher,
};
pub use workflow::{
    CancelHandle, CancelSignal, NodeExecutor, PluginNodeConfig, PluginNodeResult, WorkflowContext,
    cancel_pair,
};
