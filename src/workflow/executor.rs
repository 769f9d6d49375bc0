//! Plugin node executor - resolve, invoke, classify, retry
//!
//! Runs one plugin node against the gateway as an explicit attempt loop:
//! param mappings are re-resolved before every attempt, the outcome of each
//! attempt is classified, and retryable failures wait a cancellable interval
//! before the next attempt. Configuration errors never retry. A terminal
//! failure always writes an error object into the node's output slot so
//! downstream expressions observe it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::{Value, json};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::context::WorkflowContext;
use super::node::{PluginNodeConfig, PluginNodeResult, error_code};
use crate::gateway::OperationGateway;
use crate::invoke::{Arguments, InvocationResult};

/// Create a linked cancellation handle/signal pair
#[must_use]
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

/// Requests cancellation of executions holding the paired signal
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Request cancellation; idempotent
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Observes a cancellation request
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Whether cancellation has been requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once cancellation is requested.
    ///
    /// Pends forever when the handle is dropped without cancelling, so
    /// `select!` arms racing against it simply never fire.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if *rx.borrow() {
            return;
        }
        loop {
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
            if *rx.borrow() {
                return;
            }
        }
    }
}

/// What one classified attempt decided
enum Attempt {
    Success {
        data: Value,
        http_status: u16,
    },
    Failure {
        code: &'static str,
        message: String,
        http_status: Option<u16>,
        retryable: bool,
    },
}

/// Executes plugin nodes with retries and context write-back
#[derive(Clone)]
pub struct NodeExecutor {
    gateway: Arc<OperationGateway>,
}

impl std::fmt::Debug for NodeExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeExecutor").finish_non_exhaustive()
    }
}

impl NodeExecutor {
    /// Create an executor over a gateway
    #[must_use]
    pub const fn new(gateway: Arc<OperationGateway>) -> Self {
        Self { gateway }
    }

    /// Execute one node without external cancellation
    pub async fn execute(
        &self,
        config: &PluginNodeConfig,
        ctx: &mut WorkflowContext,
    ) -> PluginNodeResult {
        let (_handle, signal) = cancel_pair();
        self.execute_with_cancel(config, ctx, &signal).await
    }

    /// Execute one node, aborting promptly when `cancel` fires.
    ///
    /// Cancellation is observed both mid-request and mid-backoff; a
    /// cancelled node reports [`error_code::CANCELLED`] and is treated as a
    /// terminal failure.
    pub async fn execute_with_cancel(
        &self,
        config: &PluginNodeConfig,
        ctx: &mut WorkflowContext,
        cancel: &CancelSignal,
    ) -> PluginNodeResult {
        let started_at = Utc::now();
        let started = Instant::now();
        ctx.log(format!(
            "node {}: invoking {}/{}",
            config.node_id, config.plugin_id, config.operation_id
        ));

        let mut retries_performed: u32 = 0;
        let outcome = loop {
            if cancel.is_cancelled() {
                break Attempt::Failure {
                    code: error_code::CANCELLED,
                    message: "execution cancelled".to_string(),
                    http_status: None,
                    retryable: false,
                };
            }

            // Context may have changed since the previous attempt.
            let args = resolve_arguments(ctx, config);

            let invoked = tokio::select! {
                () = cancel.cancelled() => None,
                result = self.gateway.invoke(
                    &config.plugin_id,
                    &config.operation_id,
                    &args,
                    config.timeout_ms,
                ) => Some(result),
            };

            let attempt = match invoked {
                None => Attempt::Failure {
                    code: error_code::CANCELLED,
                    message: "execution cancelled".to_string(),
                    http_status: None,
                    retryable: false,
                },
                Some(result) => classify(result),
            };

            match &attempt {
                Attempt::Success { .. } => break attempt,
                Attempt::Failure {
                    code,
                    message,
                    retryable,
                    ..
                } => {
                    if !retryable || retries_performed >= config.retry_count {
                        break attempt;
                    }
                    retries_performed += 1;
                    ctx.log(format!(
                        "node {}: attempt failed ({code}: {message}), retry {retries_performed}/{}",
                        config.node_id, config.retry_count
                    ));
                    debug!(
                        node_id = %config.node_id,
                        code,
                        retry = retries_performed,
                        "retrying after failure"
                    );
                    let backoff = Duration::from_millis(config.retry_interval_ms);
                    tokio::select! {
                        () = cancel.cancelled() => {
                            break Attempt::Failure {
                                code: error_code::CANCELLED,
                                message: "execution cancelled during retry backoff".to_string(),
                                http_status: None,
                                retryable: false,
                            };
                        }
                        () = tokio::time::sleep(backoff) => {}
                    }
                }
            }
        };

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let ended_at = Utc::now();

        match outcome {
            Attempt::Success { data, http_status } => {
                ctx.set_node_output(&config.node_id, data.clone());
                if let Some(variable) = &config.output_mapping {
                    ctx.set_variable(variable, data.clone());
                }
                ctx.log(format!(
                    "node {}: completed with HTTP {http_status} in {duration_ms}ms",
                    config.node_id
                ));
                PluginNodeResult {
                    success: true,
                    data: Some(data),
                    error_code: None,
                    error_message: None,
                    http_status: Some(http_status),
                    duration_ms,
                    started_at,
                    ended_at,
                    retry_count: retries_performed,
                    continue_on_error: config.continue_on_error,
                }
            }
            Attempt::Failure {
                code,
                message,
                http_status,
                ..
            } => {
                warn!(
                    node_id = %config.node_id,
                    code,
                    http_status,
                    "node failed terminally"
                );
                ctx.log(format!(
                    "node {}: failed with {code} after {} retries: {message}",
                    config.node_id, retries_performed
                ));
                // Downstream expressions can read the failure shape whether
                // or not the workflow proceeds past this node.
                ctx.set_node_output(
                    &config.node_id,
                    json!({
                        "success": false,
                        "errorCode": code,
                        "errorMessage": message,
                        "httpStatus": http_status,
                    }),
                );
                PluginNodeResult {
                    success: false,
                    data: None,
                    error_code: Some(code.to_string()),
                    error_message: Some(message),
                    http_status,
                    duration_ms,
                    started_at,
                    ended_at,
                    retry_count: retries_performed,
                    continue_on_error: config.continue_on_error,
                }
            }
        }
    }
}

/// Resolve each param mapping against the context
fn resolve_arguments(ctx: &WorkflowContext, config: &PluginNodeConfig) -> Arguments {
    config
        .param_mappings
        .iter()
        .map(|(name, value)| (name.clone(), ctx.resolve_expression(value)))
        .collect()
}

fn classify(invoked: crate::Result<InvocationResult>) -> Attempt {
    match invoked {
        Ok(InvocationResult::Success {
            http_status,
            parsed_body,
            ..
        }) => Attempt::Success {
            data: parsed_body,
            http_status,
        },
        Ok(InvocationResult::Timeout {
            request_url,
            duration_ms,
        }) => Attempt::Failure {
            code: error_code::TIMEOUT,
            message: format!("request to {request_url} timed out after {duration_ms}ms"),
            http_status: None,
            retryable: true,
        },
        Ok(InvocationResult::TransportError { message, .. }) => Attempt::Failure {
            code: error_code::NETWORK_ERROR,
            message,
            http_status: None,
            retryable: true,
        },
        Ok(InvocationResult::ApplicationError {
            message,
            http_status,
            ..
        }) => Attempt::Failure {
            code: error_code::INVOKE_ERROR,
            message,
            http_status,
            retryable: true,
        },
        Err(e) => {
            let code = if e.is_configuration() {
                error_code::CONFIG_ERROR
            } else {
                error_code::INVOKE_ERROR
            };
            Attempt::Failure {
                code,
                message: e.to_string(),
                http_status: None,
                retryable: false,
            }
        }
    }
}
