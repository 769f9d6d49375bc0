//! Plugin node configuration and result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Stable error codes reported by node execution
pub mod error_code {
    /// The invocation hit its deadline on every attempt
    pub const TIMEOUT: &str = "TIMEOUT";
    /// Connection, DNS, or TLS failure on every attempt
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    /// The request or its response was unusable
    pub const INVOKE_ERROR: &str = "INVOKE_ERROR";
    /// The plugin or operation is misconfigured; never retried
    pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
    /// Execution was cancelled before completing
    pub const CANCELLED: &str = "CANCELLED";
}

/// Configuration of one plugin node in a workflow
#[derive(Debug, Clone, Deserialize)]
pub struct PluginNodeConfig {
    /// Node id, unique within the workflow
    pub node_id: String,
    /// Plugin to invoke
    pub plugin_id: String,
    /// Operation within the plugin
    pub operation_id: String,
    /// Argument mappings; values may be `${...}` expressions
    #[serde(default)]
    pub param_mappings: Map<String, Value>,
    /// Variable name to copy the node output into on success
    #[serde(default)]
    pub output_mapping: Option<String>,
    /// Per-attempt timeout override in milliseconds
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Whether the workflow should proceed past a terminal failure
    #[serde(default)]
    pub continue_on_error: bool,
    /// Number of retries after the first attempt
    #[serde(default)]
    pub retry_count: u32,
    /// Pause between attempts in milliseconds
    #[serde(default)]
    pub retry_interval_ms: u64,
}

/// Outcome of one plugin node execution
#[derive(Debug, Clone, Serialize)]
pub struct PluginNodeResult {
    /// Whether the node completed successfully
    pub success: bool,
    /// Parsed response body on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Stable error code on failure, from [`error_code`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Human-readable failure description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// HTTP status of the final attempt, when a response was received
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    /// Wall-clock duration of the whole execution, retries included
    pub duration_ms: u64,
    /// When execution started
    pub started_at: DateTime<Utc>,
    /// When execution ended
    pub ended_at: DateTime<Utc>,
    /// Retries actually performed (0 when the first attempt decided)
    pub retry_count: u32,
    /// The node's `continue_on_error` setting, echoed for the caller
    pub continue_on_error: bool,
}
