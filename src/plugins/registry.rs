//! Plugin registry contract and in-memory implementation
//!
//! Persistence of plugin records is an external concern; the gateway only
//! requires lookup by plugin id and by (plugin id, operation id).

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::descriptor::{OperationDescriptor, PluginRecord};

/// Lookup contract the gateway requires from a plugin store
#[async_trait]
pub trait PluginRegistry: Send + Sync {
    /// Look up a plugin by id
    async fn plugin(&self, plugin_id: &str) -> Option<PluginRecord>;

    /// Look up a single operation by (plugin id, operation id)
    async fn operation(
        &self,
        plugin_id: &str,
        operation_id: &str,
    ) -> Option<OperationDescriptor> {
        self.plugin(plugin_id)
            .await
            .and_then(|p| p.operation(operation_id).cloned())
    }

    /// All registered plugins, in registration order
    async fn plugins(&self) -> Vec<PluginRecord>;
}

/// In-memory registry for composition and tests
///
/// Registration order is preserved so catalogs built from `plugins()` are
/// deterministic.
#[derive(Debug, Default)]
pub struct InMemoryPluginRegistry {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    by_id: HashMap<String, PluginRecord>,
    order: Vec<String>,
}

impl InMemoryPluginRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a plugin record
    pub fn register(&self, plugin: PluginRecord) {
        let mut inner = self.inner.write().expect("registry lock poisoned");
        if !inner.by_id.contains_key(&plugin.id) {
            inner.order.push(plugin.id.clone());
        }
        inner.by_id.insert(plugin.id.clone(), plugin);
    }

    /// Flip a plugin's enabled flag; returns false when the plugin is unknown
    pub fn set_enabled(&self, plugin_id: &str, enabled: bool) -> bool {
        let mut inner = self.inner.write().expect("registry lock poisoned");
        match inner.by_id.get_mut(plugin_id) {
            Some(plugin) => {
                plugin.enabled = enabled;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl PluginRegistry for InMemoryPluginRegistry {
    async fn plugin(&self, plugin_id: &str) -> Option<PluginRecord> {
        let inner = self.inner.read().expect("registry lock poisoned");
        inner.by_id.get(plugin_id).cloned()
    }

    async fn plugins(&self) -> Vec<PluginRecord> {
        let inner = self.inner.read().expect("registry lock poisoned");
        inner
            .order
            .iter()
            .filter_map(|id| inner.by_id.get(id).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::descriptor::HttpMethod;

    fn sample_plugin(id: &str) -> PluginRecord {
        PluginRecord {
            id: id.to_string(),
            name: format!("Plugin {id}"),
            description: None,
            base_url: Some("http://example.test".into()),
            auth: crate::plugins::AuthDescriptor::None,
            enabled: true,
            operations: vec![OperationDescriptor {
                operation_id: "getSensorData".into(),
                name: None,
                method: HttpMethod::Get,
                path: "/sensor".into(),
                description: None,
                input_schema: None,
                output_schema: None,
            }],
        }
    }

    #[tokio::test]
    async fn register_and_lookup() {
        let registry = InMemoryPluginRegistry::new();
        registry.register(sample_plugin("p1"));

        let plugin = registry.plugin("p1").await.unwrap();
        assert_eq!(plugin.name, "Plugin p1");

        let op = registry.operation("p1", "getSensorData").await.unwrap();
        assert_eq!(op.path, "/sensor");

        assert!(registry.plugin("missing").await.is_none());
        assert!(registry.operation("p1", "missing").await.is_none());
    }

    #[tokio::test]
    async fn listing_preserves_registration_order() {
        let registry = InMemoryPluginRegistry::new();
        registry.register(sample_plugin("b"));
        registry.register(sample_plugin("a"));
        registry.register(sample_plugin("c"));

        let ids: Vec<String> = registry.plugins().await.into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn replacing_keeps_original_position() {
        let registry = InMemoryPluginRegistry::new();
        registry.register(sample_plugin("a"));
        registry.register(sample_plugin("b"));

        let mut replacement = sample_plugin("a");
        replacement.name = "Replaced".into();
        registry.register(replacement);

        let plugins = registry.plugins().await;
        assert_eq!(plugins[0].id, "a");
        assert_eq!(plugins[0].name, "Replaced");
        assert_eq!(plugins.len(), 2);
    }

    #[tokio::test]
    async fn set_enabled_toggles() {
        let registry = InMemoryPluginRegistry::new();
        registry.register(sample_plugin("p1"));

        assert!(registry.set_enabled("p1", false));
        assert!(!registry.plugin("p1").await.unwrap().enabled);
        assert!(!registry.set_enabled("missing", false));
    }
}
