//! Keyword tool matcher - ordered rule table over the catalog
//!
//! Scans a user query against an ordered list of keyword rules. The first
//! rule whose keyword appears selects an operation kind, which is dispatched
//! to the first catalog tool carrying that kind's marker. Required entities
//! (the device id) are resolved from the query first, then from the session
//! cache; a hit from either path refreshes the cache.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use super::catalog::{ToolCatalog, ToolKey};
use super::entities::{ChatMessage, EntityKind, SessionEntityStore, extract_device_id};
use crate::gateway::OperationGateway;
use crate::invoke::Arguments;

/// Operation families the matcher can dispatch to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Read a sensor value
    SensorRead,
    /// Switch a device port on or off
    DeviceControl,
    /// Run a named preset scene
    PresetExecute,
}

impl OperationKind {
    /// Substring that identifies tools of this kind in the catalog
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::SensorRead => "getSensorData",
            Self::DeviceControl => "controlDevice",
            Self::PresetExecute => "executePreset",
        }
    }
}

/// One keyword rule: any listed keyword selects the kind
#[derive(Debug, Clone, Deserialize)]
pub struct MatchRule {
    /// Keywords checked with case-folded substring containment
    pub keywords: Vec<String>,
    /// Operation kind the rule dispatches to
    pub kind: OperationKind,
}

/// Built-in rule table.
///
/// Order is the tie-break: sensor queries before device control before
/// presets, so "开灯测温度" reads as a sensor query.
#[must_use]
pub fn default_rules() -> Vec<MatchRule> {
    vec![
        MatchRule {
            keywords: [
                "温度", "湿度", "传感器", "环境", "检测", "测量", "多少度", "气温",
            ]
            .map(str::to_string)
            .to_vec(),
            kind: OperationKind::SensorRead,
        },
        MatchRule {
            keywords: ["led", "灯", "开灯", "关灯", "亮", "灭"]
                .map(str::to_string)
                .to_vec(),
            kind: OperationKind::DeviceControl,
        },
        MatchRule {
            keywords: ["预设", "preset", "模式"].map(str::to_string).to_vec(),
            kind: OperationKind::PresetExecute,
        },
    ]
}

/// Outcome of a match-and-invoke pass
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    /// No rule keyword appeared in the query
    NoMatch,
    /// A rule matched but the required device id is neither in the query nor
    /// in the session cache
    MissingRequiredEntity,
    /// A tool was selected and invoked to completion
    Matched {
        /// Identity of the invoked tool
        tool: ToolKey,
        /// Catalog name of the invoked tool
        name: String,
        /// Parsed response body
        result: Value,
    },
}

/// Matches queries against the catalog and invokes the selected tool
pub struct ToolMatcher {
    gateway: Arc<OperationGateway>,
    entities: Arc<SessionEntityStore>,
    rules: Vec<MatchRule>,
}

impl std::fmt::Debug for ToolMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolMatcher")
            .field("rules", &self.rules.len())
            .finish_non_exhaustive()
    }
}

impl ToolMatcher {
    /// Create a matcher with the built-in rule table
    #[must_use]
    pub fn new(gateway: Arc<OperationGateway>, entities: Arc<SessionEntityStore>) -> Self {
        Self::with_rules(gateway, entities, default_rules())
    }

    /// Create a matcher with a custom rule table
    #[must_use]
    pub fn with_rules(
        gateway: Arc<OperationGateway>,
        entities: Arc<SessionEntityStore>,
        rules: Vec<MatchRule>,
    ) -> Self {
        Self {
            gateway,
            entities,
            rules,
        }
    }

    /// Seed the session entity cache from prior conversation turns
    pub fn seed_from_history(&self, session_id: &str, history: &[ChatMessage]) {
        self.entities.seed_from_history(session_id, history);
    }

    /// Match `query` against the rules and invoke the selected tool.
    ///
    /// Rules are tried in order; a rule whose tool is missing from the
    /// catalog, or whose invocation does not complete successfully, does not
    /// end the scan. `MissingRequiredEntity` does end it: invoking without
    /// the device id would be a guaranteed failure.
    pub async fn select_and_invoke(
        &self,
        query: &str,
        catalog: &ToolCatalog,
        session_id: Option<&str>,
    ) -> MatchOutcome {
        let folded = query.to_lowercase();

        for rule in &self.rules {
            let Some(keyword) = rule
                .keywords
                .iter()
                .find(|k| folded.contains(&k.to_lowercase()))
            else {
                continue;
            };
            debug!(keyword, kind = ?rule.kind, "rule matched");

            let Some(tool) = catalog.first_matching(rule.kind.marker()) else {
                debug!(kind = ?rule.kind, "no catalog tool for matched kind");
                continue;
            };

            let device_id = match self.resolve_device_id(query, session_id) {
                Some(id) => id,
                None => {
                    info!(tool = %tool.name, "device id unavailable for matched tool");
                    return MatchOutcome::MissingRequiredEntity;
                }
            };

            let args = build_arguments(rule.kind, &folded, &device_id);
            match self
                .gateway
                .invoke(&tool.key.plugin_id, &tool.key.operation_id, &args, None)
                .await
            {
                Ok(result) if result.is_success() => {
                    info!(tool = %tool.name, "matched tool invoked");
                    let parsed = result.parsed_body().cloned().unwrap_or(Value::Null);
                    return MatchOutcome::Matched {
                        tool: tool.key.clone(),
                        name: tool.name.clone(),
                        result: parsed,
                    };
                }
                Ok(result) => {
                    debug!(tool = %tool.name, outcome = ?result, "invocation did not complete");
                }
                Err(e) => {
                    debug!(tool = %tool.name, error = %e, "invocation failed");
                }
            }
        }

        MatchOutcome::NoMatch
    }

    /// Device id from the query text, falling back to the session cache.
    ///
    /// Either source refreshes the cache so follow-up queries keep working.
    fn resolve_device_id(&self, query: &str, session_id: Option<&str>) -> Option<String> {
        if let Some(id) = extract_device_id(query) {
            if let Some(session) = session_id {
                self.entities.put(session, EntityKind::DeviceId, id.clone());
            }
            return Some(id);
        }

        let session = session_id?;
        let cached = self.entities.get(session, EntityKind::DeviceId)?;
        debug!(session, "device id resolved from session cache");
        self.entities
            .put(session, EntityKind::DeviceId, cached.clone());
        Some(cached)
    }
}

/// Assemble the argument map for one operation kind
fn build_arguments(kind: OperationKind, folded_query: &str, device_id: &str) -> Arguments {
    let value = match kind {
        OperationKind::SensorRead => {
            let sensor = if folded_query.contains("湿度") {
                "DHT11_humidity"
            } else {
                "DHT11_temperature"
            };
            json!({ "uuid": device_id, "sensor": sensor })
        }
        OperationKind::DeviceControl => {
            let port_id = if folded_query.contains("led2")
                || folded_query.contains("2号")
                || folded_query.contains("二号")
            {
                2
            } else {
                1
            };
            let action = if folded_query.contains('关')
                || folded_query.contains('灭')
                || folded_query.contains("off")
            {
                "off"
            } else {
                "on"
            };
            json!({
                "device_uuid": device_id,
                "port_type": "led",
                "port_id": port_id,
                "action": action,
            })
        }
        OperationKind::PresetExecute => {
            let preset_name = if folded_query.contains("工作") {
                "work"
            } else if folded_query.contains("休息") || folded_query.contains("睡眠") {
                "rest"
            } else {
                "default"
            };
            json!({ "device_uuid": device_id, "preset_name": preset_name })
        }
    };

    match value {
        Value::Object(map) => map,
        _ => Arguments::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICE: &str = "1fcb3c12-63eb-4a67-9f85-293e24bf367c";

    fn first_kind(query: &str) -> Option<OperationKind> {
        let folded = query.to_lowercase();
        default_rules()
            .into_iter()
            .find(|rule| {
                rule.keywords
                    .iter()
                    .any(|k| folded.contains(&k.to_lowercase()))
            })
            .map(|rule| rule.kind)
    }

    #[test]
    fn sensor_keywords_select_sensor_read() {
        for query in ["现在温度多少", "湿度怎么样", "环境检测一下", "气温如何"] {
            assert_eq!(first_kind(query), Some(OperationKind::SensorRead), "{query}");
        }
    }

    #[test]
    fn control_keywords_select_device_control() {
        for query in ["开灯", "把LED关掉", "灯灭了吗"] {
            assert_eq!(
                first_kind(query),
                Some(OperationKind::DeviceControl),
                "{query}"
            );
        }
    }

    #[test]
    fn preset_keywords_select_preset_execute() {
        for query in ["切换到工作模式", "run the preset"] {
            assert_eq!(
                first_kind(query),
                Some(OperationKind::PresetExecute),
                "{query}"
            );
        }
    }

    #[test]
    fn rule_order_breaks_ties() {
        // Contains both a sensor and a control keyword; sensor rule is first.
        assert_eq!(first_kind("开灯测温度"), Some(OperationKind::SensorRead));
    }

    #[test]
    fn unrelated_query_matches_nothing() {
        assert_eq!(first_kind("讲个笑话"), None);
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        assert_eq!(first_kind("turn the LED on"), Some(OperationKind::DeviceControl));
    }

    #[test]
    fn sensor_arguments_pick_the_sensor_from_the_query() {
        let args = build_arguments(OperationKind::SensorRead, "湿度多少", DEVICE);
        assert_eq!(args["sensor"], "DHT11_humidity");
        assert_eq!(args["uuid"], DEVICE);

        let args = build_arguments(OperationKind::SensorRead, "温度多少", DEVICE);
        assert_eq!(args["sensor"], "DHT11_temperature");
    }

    #[test]
    fn control_arguments_pick_port_and_action() {
        let args = build_arguments(OperationKind::DeviceControl, "关掉led2", DEVICE);
        assert_eq!(args["port_id"], 2);
        assert_eq!(args["action"], "off");
        assert_eq!(args["port_type"], "led");

        let args = build_arguments(OperationKind::DeviceControl, "开灯", DEVICE);
        assert_eq!(args["port_id"], 1);
        assert_eq!(args["action"], "on");

        let args = build_arguments(OperationKind::DeviceControl, "二号灯灭", DEVICE);
        assert_eq!(args["port_id"], 2);
        assert_eq!(args["action"], "off");
    }

    #[test]
    fn preset_arguments_map_query_to_preset_name() {
        let args = build_arguments(OperationKind::PresetExecute, "工作模式", DEVICE);
        assert_eq!(args["preset_name"], "work");

        let args = build_arguments(OperationKind::PresetExecute, "睡眠模式", DEVICE);
        assert_eq!(args["preset_name"], "rest");

        let args = build_arguments(OperationKind::PresetExecute, "换个模式", DEVICE);
        assert_eq!(args["preset_name"], "default");
    }
}
