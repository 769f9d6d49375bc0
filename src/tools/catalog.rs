//! Tool catalog - deterministic tool surface over registered plugins
//!
//! Every enabled operation becomes one named tool. Names derive purely from
//! plugin and operation identifiers, so the same registry contents always
//! produce the same catalog, in registry order.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::plugins::PluginRecord;

/// Stable identity of a tool, independent of its display name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolKey {
    /// Owning plugin
    pub plugin_id: String,
    /// Operation within the plugin
    pub operation_id: String,
}

impl ToolKey {
    /// Build a key from owned or borrowed id parts
    #[must_use]
    pub fn new(plugin_id: impl Into<String>, operation_id: impl Into<String>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            operation_id: operation_id.into(),
        }
    }
}

/// One callable tool derived from a plugin operation
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    /// Deterministic tool name
    pub name: String,
    /// Human-readable description, prefixed with the plugin name
    pub description: String,
    /// JSON Schema for the tool's arguments
    pub parameters: Value,
    /// Identity used to dispatch an invocation
    pub key: ToolKey,
}

/// Ordered collection of tools derived from a plugin set
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: Vec<ToolDescriptor>,
}

impl ToolCatalog {
    /// Build a catalog from plugin records, skipping disabled plugins.
    ///
    /// Tool order follows plugin order, then operation order within each
    /// plugin. Name collisions get a numeric suffix in that same order, so
    /// the mapping is stable across rebuilds.
    #[must_use]
    pub fn build(plugins: &[PluginRecord]) -> Self {
        let mut tools: Vec<ToolDescriptor> = Vec::new();
        for plugin in plugins {
            if !plugin.enabled {
                continue;
            }
            for operation in &plugin.operations {
                let base = tool_name(&plugin.id, &operation.operation_id);
                let mut name = base.clone();
                let mut suffix = 1;
                while tools.iter().any(|t| t.name == name) {
                    name = format!("{base}_{suffix}");
                    suffix += 1;
                }

                let label = operation
                    .description
                    .as_deref()
                    .or(operation.name.as_deref())
                    .unwrap_or(&operation.operation_id);

                tools.push(ToolDescriptor {
                    name,
                    description: format!("[{}] {label}", plugin.name),
                    parameters: parameters_schema(operation.input_schema.as_ref()),
                    key: ToolKey::new(&plugin.id, &operation.operation_id),
                });
            }
        }
        Self { tools }
    }

    /// Tools in catalog order
    #[must_use]
    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// Number of tools
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the catalog is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool with an exact name
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// First tool whose name contains `marker`, in catalog order
    #[must_use]
    pub fn first_matching(&self, marker: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name.contains(marker))
    }

    /// Render the catalog as OpenAI-style function definitions
    #[must_use]
    pub fn to_llm_functions(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.parameters,
                    }
                })
            })
            .collect()
    }
}

/// Derive the tool name for one operation.
///
/// The plugin id contributes its first eight characters after any `plugin_`
/// prefix, keeping names short while staying collision-resistant for
/// UUID-shaped ids.
fn tool_name(plugin_id: &str, operation_id: &str) -> String {
    let trimmed = plugin_id.strip_prefix("plugin_").unwrap_or(plugin_id);
    let short: String = trimmed.chars().take(8).collect();
    format!("plugin_{short}_{operation_id}")
}

fn parameters_schema(input_schema: Option<&Value>) -> Value {
    let (properties, required) = match input_schema {
        Some(schema) => (
            schema
                .get("properties")
                .cloned()
                .unwrap_or_else(|| json!({})),
            schema.get("required").cloned().unwrap_or_else(|| json!([])),
        ),
        None => (json!({}), json!([])),
    };
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::{AuthDescriptor, HttpMethod, OperationDescriptor};

    fn operation(id: &str, description: Option<&str>) -> OperationDescriptor {
        OperationDescriptor {
            operation_id: id.into(),
            name: None,
            method: HttpMethod::Get,
            path: format!("/{id}"),
            description: description.map(str::to_string),
            input_schema: None,
            output_schema: None,
        }
    }

    fn plugin(id: &str, name: &str, enabled: bool, operations: Vec<OperationDescriptor>) -> PluginRecord {
        PluginRecord {
            id: id.into(),
            name: name.into(),
            description: None,
            base_url: Some("http://host".into()),
            auth: AuthDescriptor::None,
            enabled,
            operations,
        }
    }

    #[test]
    fn names_are_deterministic() {
        let plugins = vec![plugin(
            "plugin_1fcb3c12-63eb",
            "Sensors",
            true,
            vec![operation("getSensorData", Some("Read sensor values"))],
        )];

        let first = ToolCatalog::build(&plugins);
        let second = ToolCatalog::build(&plugins);
        assert_eq!(first.tools()[0].name, "plugin_1fcb3c12_getSensorData");
        assert_eq!(first.tools()[0].name, second.tools()[0].name);
        assert_eq!(
            first.tools()[0].description,
            "[Sensors] Read sensor values"
        );
    }

    #[test]
    fn plugin_prefix_is_not_doubled_into_the_short_id() {
        let plugins = vec![plugin(
            "abcdef1234567890",
            "P",
            true,
            vec![operation("op", None)],
        )];
        let catalog = ToolCatalog::build(&plugins);
        assert_eq!(catalog.tools()[0].name, "plugin_abcdef12_op");
    }

    #[test]
    fn disabled_plugins_are_excluded() {
        let plugins = vec![
            plugin("plugin_aaaaaaaa", "A", false, vec![operation("op", None)]),
            plugin("plugin_bbbbbbbb", "B", true, vec![operation("op", None)]),
        ];
        let catalog = ToolCatalog::build(&plugins);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.tools()[0].key.plugin_id, "plugin_bbbbbbbb");
    }

    #[test]
    fn colliding_names_get_numeric_suffixes() {
        // Same first 8 id chars and same operation id collide.
        let plugins = vec![
            plugin("plugin_aaaaaaaa-1111", "A1", true, vec![operation("op", None)]),
            plugin("plugin_aaaaaaaa-2222", "A2", true, vec![operation("op", None)]),
            plugin("plugin_aaaaaaaa-3333", "A3", true, vec![operation("op", None)]),
        ];
        let catalog = ToolCatalog::build(&plugins);
        let names: Vec<&str> = catalog.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "plugin_aaaaaaaa_op",
                "plugin_aaaaaaaa_op_1",
                "plugin_aaaaaaaa_op_2"
            ]
        );
        // Keys still point at distinct plugins.
        assert_eq!(catalog.find_by_name("plugin_aaaaaaaa_op_2").unwrap().key.plugin_id, "plugin_aaaaaaaa-3333");
    }

    #[test]
    fn description_falls_back_to_name_then_operation_id() {
        let mut op = operation("readValues", None);
        op.name = Some("Read values".into());
        let plugins = vec![plugin(
            "plugin_cccccccc",
            "C",
            true,
            vec![op, operation("bare", None)],
        )];
        let catalog = ToolCatalog::build(&plugins);
        assert_eq!(catalog.tools()[0].description, "[C] Read values");
        assert_eq!(catalog.tools()[1].description, "[C] bare");
    }

    #[test]
    fn parameters_derive_from_input_schema() {
        let mut op = operation("op", None);
        op.input_schema = Some(serde_json::json!({
            "type": "object",
            "properties": {"uuid": {"type": "string"}},
            "required": ["uuid"],
        }));
        let plugins = vec![plugin("plugin_dddddddd", "D", true, vec![op])];
        let catalog = ToolCatalog::build(&plugins);
        let params = &catalog.tools()[0].parameters;
        assert_eq!(params["type"], "object");
        assert_eq!(params["properties"]["uuid"]["type"], "string");
        assert_eq!(params["required"][0], "uuid");
    }

    #[test]
    fn missing_schema_yields_empty_object_schema() {
        let plugins = vec![plugin("plugin_eeeeeeee", "E", true, vec![operation("op", None)])];
        let catalog = ToolCatalog::build(&plugins);
        let params = &catalog.tools()[0].parameters;
        assert_eq!(params["properties"], serde_json::json!({}));
        assert_eq!(params["required"], serde_json::json!([]));
    }

    #[test]
    fn first_matching_honors_catalog_order() {
        let plugins = vec![
            plugin(
                "plugin_ffffffff",
                "F",
                true,
                vec![operation("controlDevice", None), operation("getSensorData", None)],
            ),
        ];
        let catalog = ToolCatalog::build(&plugins);
        let tool = catalog.first_matching("getSensorData").unwrap();
        assert_eq!(tool.key.operation_id, "getSensorData");
        assert!(catalog.first_matching("nothingLikeThis").is_none());
    }

    #[test]
    fn llm_functions_shape() {
        let plugins = vec![plugin("plugin_99999999", "G", true, vec![operation("op", None)])];
        let functions = ToolCatalog::build(&plugins).to_llm_functions();
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0]["type"], "function");
        assert_eq!(functions[0]["function"]["name"], "plugin_99999999_op");
        assert_eq!(functions[0]["function"]["parameters"]["type"], "object");
    }
}
