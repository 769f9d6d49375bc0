//! Operation gateway - registry lookup + request build + invocation
//!
//! The single entry point both the tool matcher and the workflow executor go
//! through to call a plugin operation.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::invoke::{Arguments, HttpInvoker, InvocationResult, build_request};
use crate::plugins::PluginRegistry;
use crate::{Error, Result};

/// Invokes plugin operations by `(plugin_id, operation_id)`
#[derive(Clone)]
pub struct OperationGateway {
    registry: Arc<dyn PluginRegistry>,
    invoker: HttpInvoker,
    default_timeout_ms: u64,
}

impl std::fmt::Debug for OperationGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationGateway")
            .field("default_timeout_ms", &self.default_timeout_ms)
            .finish_non_exhaustive()
    }
}

impl OperationGateway {
    /// Create a gateway over a registry with a default invoker
    #[must_use]
    pub fn new(registry: Arc<dyn PluginRegistry>) -> Self {
        Self {
            registry,
            invoker: HttpInvoker::new(),
            default_timeout_ms: crate::invoke::DEFAULT_TIMEOUT_MS,
        }
    }

    /// Replace the invoker (shared client, test doubles)
    #[must_use]
    pub fn with_invoker(mut self, invoker: HttpInvoker) -> Self {
        self.invoker = invoker;
        self
    }

    /// Override the default timeout applied when a call site passes `None`
    #[must_use]
    pub const fn with_default_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.default_timeout_ms = timeout_ms;
        self
    }

    /// Registry this gateway resolves operations against
    #[must_use]
    pub fn registry(&self) -> &Arc<dyn PluginRegistry> {
        &self.registry
    }

    /// Invoke one operation with an argument map.
    ///
    /// Timeouts, transport failures, and HTTP error statuses are returned as
    /// [`InvocationResult`] variants, not errors.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the plugin is unknown or disabled,
    /// the operation is unknown, or the plugin has no base URL. These are
    /// fatal and must not be retried.
    pub async fn invoke(
        &self,
        plugin_id: &str,
        operation_id: &str,
        args: &Arguments,
        timeout_ms: Option<u64>,
    ) -> Result<InvocationResult> {
        let plugin = self
            .registry
            .plugin(plugin_id)
            .await
            .ok_or_else(|| Error::PluginNotFound(plugin_id.to_string()))?;

        if !plugin.enabled {
            warn!(plugin_id, "refusing to invoke disabled plugin");
            return Err(Error::PluginDisabled(plugin_id.to_string()));
        }

        let operation = plugin.operation(operation_id).ok_or_else(|| {
            Error::OperationNotFound {
                plugin_id: plugin_id.to_string(),
                operation_id: operation_id.to_string(),
            }
        })?;

        let request = build_request(&plugin, operation, args)?;
        debug!(
            plugin_id,
            operation_id,
            method = %request.method,
            url = %request.url,
            "invoking plugin operation"
        );

        let timeout = timeout_ms.or(Some(self.default_timeout_ms));
        Ok(self.invoker.invoke(&request, timeout).await)
    }
}
