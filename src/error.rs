//! Error types for the Conduit gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Conduit gateway
///
/// Invocation outcomes (timeouts, transport failures, HTTP error statuses)
/// are *not* errors - they are carried as [`crate::invoke::InvocationResult`]
/// variants so callers can decide their semantics. This enum covers
/// configuration and registry problems, which are fatal and never retried.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (missing base URL, malformed operation definition)
    #[error("configuration error: {0}")]
    Config(String),

    /// Plugin not found in the registry
    #[error("plugin not found: {0}")]
    PluginNotFound(String),

    /// Plugin exists but is disabled
    #[error("plugin disabled: {0}")]
    PluginDisabled(String),

    /// Operation not found on the plugin
    #[error("operation not found: {plugin_id}/{operation_id}")]
    OperationNotFound {
        /// Owning plugin id
        plugin_id: String,
        /// Missing operation id
        operation_id: String,
    },

    /// HTTP client error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error is a configuration problem.
    ///
    /// Configuration errors are surfaced to the caller as-is and are never
    /// retried by the workflow executor.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::PluginNotFound(_)
                | Self::PluginDisabled(_)
                | Self::OperationNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_flagged() {
        assert!(Error::Config("no base url".into()).is_configuration());
        assert!(Error::PluginNotFound("p1".into()).is_configuration());
        assert!(Error::PluginDisabled("p1".into()).is_configuration());
        assert!(
            Error::OperationNotFound {
                plugin_id: "p1".into(),
                operation_id: "op".into(),
            }
            .is_configuration()
        );
    }

    #[test]
    fn io_errors_are_not_configuration() {
        let err = Error::Io(std::io::Error::other("boom"));
        assert!(!err.is_configuration());
    }
}
