//! Plugin and operation descriptors
//!
//! A plugin is a named collection of HTTP operations sharing a base URL and
//! auth configuration. Descriptors are immutable per invocation; the registry
//! owns their lifecycle.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// HTTP methods an operation may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET - arguments become query parameters
    Get,
    /// POST - arguments become a JSON body
    Post,
    /// PUT - arguments become a JSON body
    Put,
    /// PATCH - arguments become a JSON body
    Patch,
    /// DELETE - arguments become a JSON body
    Delete,
}

impl HttpMethod {
    /// Canonical upper-case name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Whether arguments are serialized as a request body for this method
    #[must_use]
    pub const fn carries_body(self) -> bool {
        !matches!(self, Self::Get)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Auth configuration applied at request-build time
///
/// Secrets are redacted from `Debug` output; auth material is never logged.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthDescriptor {
    /// No authentication
    #[default]
    None,
    /// API key sent in a named header
    ApiKey {
        /// Header name; defaults to `X-API-Key`
        #[serde(default = "default_api_key_header")]
        header: String,
        /// The key value
        key: String,
    },
    /// `Authorization: Bearer <token>`
    Bearer {
        /// The bearer token
        token: String,
    },
    /// HTTP basic credentials
    Basic {
        /// Username
        username: String,
        /// Password
        password: String,
    },
    /// Verbatim header map
    Custom {
        /// Headers applied as-is
        headers: BTreeMap<String, String>,
    },
}

fn default_api_key_header() -> String {
    "X-API-Key".to_string()
}

impl fmt::Debug for AuthDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::ApiKey { header, .. } => f
                .debug_struct("ApiKey")
                .field("header", header)
                .field("key", &"***")
                .finish(),
            Self::Bearer { .. } => f.debug_struct("Bearer").field("token", &"***").finish(),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            Self::Custom { headers } => {
                let keys: Vec<&str> = headers.keys().map(String::as_str).collect();
                f.debug_struct("Custom").field("headers", &keys).finish()
            }
        }
    }
}

/// Immutable description of one invocable HTTP operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationDescriptor {
    /// Operation identifier, unique within the owning plugin
    pub operation_id: String,
    /// Human-readable name
    #[serde(default)]
    pub name: Option<String>,
    /// HTTP method
    pub method: HttpMethod,
    /// Path appended to the plugin's base URL
    pub path: String,
    /// Short description, shown to matchers and LLMs
    #[serde(default)]
    pub description: Option<String>,
    /// JSON Schema for the operation's parameters
    #[serde(default)]
    pub input_schema: Option<serde_json::Value>,
    /// JSON Schema for the operation's response
    #[serde(default)]
    pub output_schema: Option<serde_json::Value>,
}

/// A registered plugin: operations sharing a base URL and auth configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginRecord {
    /// Unique plugin identifier (e.g. `plugin_66fd8f296525`)
    pub id: String,
    /// Human-readable display name
    pub name: String,
    /// Short description
    #[serde(default)]
    pub description: Option<String>,
    /// Base URL all operations are invoked against
    #[serde(default)]
    pub base_url: Option<String>,
    /// Auth applied to every request
    #[serde(default)]
    pub auth: AuthDescriptor,
    /// Disabled plugins are excluded from catalogs and refuse invocation
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// The plugin's operations
    #[serde(default)]
    pub operations: Vec<OperationDescriptor>,
}

fn default_enabled() -> bool {
    true
}

impl PluginRecord {
    /// Find an operation by id
    #[must_use]
    pub fn operation(&self, operation_id: &str) -> Option<&OperationDescriptor> {
        self.operations
            .iter()
            .find(|op| op.operation_id == operation_id)
    }
}
