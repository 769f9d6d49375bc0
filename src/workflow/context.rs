//! Workflow execution context
//!
//! Shared state a workflow run threads through its nodes: the initial input,
//! mutable variables, per-node outputs, and an execution log. Expression
//! resolution is lenient: anything that does not resolve becomes JSON null,
//! so one bad mapping never aborts a run.

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

/// Mutable state of one workflow run
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowContext {
    /// Unique id of this run
    pub run_id: String,
    /// Workflow definition id
    pub workflow_id: String,
    /// User the run executes on behalf of
    pub user_id: Option<String>,
    /// Input payload the run started with
    pub input: Map<String, Value>,
    /// Variables written by nodes via output mappings
    pub variables: Map<String, Value>,
    /// Raw output of each completed node, keyed by node id
    pub node_outputs: Map<String, Value>,
    execution_log: Vec<String>,
}

impl WorkflowContext {
    /// Create a context for a run with no input
    #[must_use]
    pub fn new(workflow_id: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            workflow_id: workflow_id.into(),
            user_id: None,
            input: Map::new(),
            variables: Map::new(),
            node_outputs: Map::new(),
            execution_log: Vec::new(),
        }
    }

    /// Create a context seeded with an input payload
    #[must_use]
    pub fn with_input(workflow_id: impl Into<String>, input: Map<String, Value>) -> Self {
        let mut ctx = Self::new(workflow_id);
        ctx.input = input;
        ctx
    }

    /// Resolve one mapping value against the context.
    ///
    /// Non-string values pass through as-is. A string of the form
    /// `${scope.path}` resolves against `input`, `context` (variables), or
    /// `nodes`; dotted paths walk nested objects. Any unresolvable or
    /// malformed expression yields `Value::Null`. Strings without the
    /// `${...}` wrapper are literals.
    #[must_use]
    pub fn resolve_expression(&self, value: &Value) -> Value {
        let Value::String(s) = value else {
            return value.clone();
        };
        let Some(rest) = s.strip_prefix("${") else {
            return value.clone();
        };
        let Some(expr) = rest.strip_suffix('}') else {
            return Value::Null;
        };

        let Some((scope, path)) = expr.split_once('.') else {
            // `${nodes.n1}` needs at least a scope and one segment; a bare
            // `${nodes}` or `${foo}` has nothing to address.
            return Value::Null;
        };

        match scope {
            "input" => walk(&self.input, path),
            "context" => walk(&self.variables, path),
            "nodes" => {
                let (node_id, field_path) = match path.split_once('.') {
                    Some((id, fields)) => (id, Some(fields)),
                    None => (path, None),
                };
                let Some(output) = self.node_outputs.get(node_id) else {
                    return Value::Null;
                };
                match field_path {
                    Some(fields) => walk_value(output, fields),
                    None => output.clone(),
                }
            }
            _ => Value::Null,
        }
    }

    /// Record a node's raw output
    pub fn set_node_output(&mut self, node_id: impl Into<String>, output: Value) {
        self.node_outputs.insert(node_id.into(), output);
    }

    /// Write a variable
    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Append a timestamped entry to the execution log
    pub fn log(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!(run_id = %self.run_id, "{message}");
        self.execution_log
            .push(format!("[{}] {message}", Utc::now().format("%Y-%m-%d %H:%M:%S")));
    }

    /// Execution log entries in append order
    #[must_use]
    pub fn execution_log(&self) -> &[String] {
        &self.execution_log
    }
}

fn walk(map: &Map<String, Value>, path: &str) -> Value {
    let mut segments = path.split('.');
    let Some(first) = segments.next() else {
        return Value::Null;
    };
    let Some(mut current) = map.get(first) else {
        return Value::Null;
    };
    for segment in segments {
        match current.get(segment) {
            Some(next) => current = next,
            None => return Value::Null,
        }
    }
    current.clone()
}

fn walk_value(value: &Value, path: &str) -> Value {
    let mut current = value;
    for segment in path.split('.') {
        match current.get(segment) {
            Some(next) => current = next,
            None => return Value::Null,
        }
    }
    current.clone()
}
