//! Configuration for the gateway
//!
//! Layered: built-in defaults, then an optional TOML file, then environment
//! variables. Plugin records themselves live in the registry; this covers
//! invocation, node, and matcher behavior.

use std::path::Path;

use serde::Deserialize;

use crate::Result;
use crate::invoke::DEFAULT_TIMEOUT_MS;
use crate::tools::matcher::{MatchRule, default_rules};
use crate::workflow::PluginNodeConfig;

/// Gateway configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Invocation defaults
    pub invoke: InvokeConfig,

    /// Plugin node defaults
    pub node: NodeDefaults,

    /// Keyword matcher rules
    pub matcher: MatcherConfig,
}

/// Invocation defaults
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InvokeConfig {
    /// Timeout applied when a call site does not pass one, in milliseconds
    pub default_timeout_ms: u64,
}

impl Default for InvokeConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Defaults applied to plugin nodes that leave retry fields unset
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeDefaults {
    /// Retries after the first attempt
    pub retry_count: u32,

    /// Pause between attempts, in milliseconds
    pub retry_interval_ms: u64,

    /// Whether workflows proceed past a failed node
    pub continue_on_error: bool,
}

impl NodeDefaults {
    /// Fill a node config's zero-valued retry fields from these defaults
    pub fn apply(&self, config: &mut PluginNodeConfig) {
        if config.retry_count == 0 {
            config.retry_count = self.retry_count;
        }
        if config.retry_interval_ms == 0 {
            config.retry_interval_ms = self.retry_interval_ms;
        }
        if !config.continue_on_error {
            config.continue_on_error = self.continue_on_error;
        }
    }
}

/// Keyword matcher rules
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Rule table in priority order; empty means the built-in table
    pub rules: Vec<MatchRule>,
}

impl MatcherConfig {
    /// Effective rule table
    #[must_use]
    pub fn effective_rules(&self) -> Vec<MatchRule> {
        if self.rules.is_empty() {
            default_rules()
        } else {
            self.rules.clone()
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a TOML file, then apply environment overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&text)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Defaults plus environment overrides, no file involved
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Some(timeout) = env_u64("CONDUIT_DEFAULT_TIMEOUT_MS") {
            self.invoke.default_timeout_ms = timeout;
        }
        if let Some(count) = env_u64("CONDUIT_NODE_RETRY_COUNT") {
            self.node.retry_count = u32::try_from(count).unwrap_or(u32::MAX);
        }
        if let Some(interval) = env_u64("CONDUIT_NODE_RETRY_INTERVAL_MS") {
            self.node.retry_interval_ms = interval;
        }
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
