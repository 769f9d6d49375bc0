//! Session entity memory
//!
//! Remembers the most recent entity (currently: device identifier) seen in a
//! conversation session, so follow-up queries like "现在怎么样" can reuse the
//! device a user named earlier. Last write wins; entries live for the
//! process lifetime; the store is explicitly injected rather than a process
//! global so the composing application controls scope.

use std::collections::HashMap;
use std::sync::{LazyLock, RwLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Kinds of entities remembered per session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A device identifier in canonical hyphenated UUID form
    DeviceId,
}

/// One prior conversation turn, used to seed the cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message role (`user`, `assistant`, `system`)
    pub role: String,
    /// Message text
    pub content: String,
}

/// Per-session last-seen-entity store
///
/// Each get/put is a single map operation under the lock; the lock is never
/// held across an await point.
#[derive(Debug, Default)]
pub struct SessionEntityStore {
    entries: RwLock<HashMap<(String, EntityKind), String>>,
}

impl SessionEntityStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last-seen entity of `kind` for `session_id`
    #[must_use]
    pub fn get(&self, session_id: &str, kind: EntityKind) -> Option<String> {
        let entries = self.entries.read().expect("entity store lock poisoned");
        entries.get(&(session_id.to_string(), kind)).cloned()
    }

    /// Remember `value` as the latest entity of `kind` for `session_id`
    pub fn put(&self, session_id: &str, kind: EntityKind, value: impl Into<String>) {
        let value = value.into();
        let mut entries = self.entries.write().expect("entity store lock poisoned");
        entries.insert((session_id.to_string(), kind), value);
    }

    /// Seed the cache from prior turns, newest first.
    ///
    /// The first device id found in any message wins; returns it when one
    /// was cached.
    pub fn seed_from_history(&self, session_id: &str, history: &[ChatMessage]) -> Option<String> {
        for message in history.iter().rev() {
            if let Some(device_id) = extract_device_id(&message.content) {
                debug!(session_id, device_id, "seeded device id from history");
                self.put(session_id, EntityKind::DeviceId, device_id.clone());
                return Some(device_id);
            }
        }
        debug!(session_id, "no device id found in history");
        None
    }
}

static CANONICAL_UUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .expect("valid regex")
});

// 32 hex chars not embedded in a longer hex run; matched greedily and
// filtered by length since the regex crate has no lookaround.
static COMPACT_UUID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9a-fA-F]{32,}").expect("valid regex"));

/// Extract a device identifier from free text.
///
/// Two shapes are recognized: the canonical hyphenated UUID, and a compact
/// 32-hex-character form which is normalized to canonical.
#[must_use]
pub fn extract_device_id(text: &str) -> Option<String> {
    if let Some(m) = CANONICAL_UUID.find(text) {
        return Some(m.as_str().to_ascii_lowercase());
    }

    COMPACT_UUID
        .find_iter(text)
        .find(|m| m.len() == 32)
        .map(|m| hyphenate(&m.as_str().to_ascii_lowercase()))
}

fn hyphenate(compact: &str) -> String {
    format!(
        "{}-{}-{}-{}-{}",
        &compact[..8],
        &compact[8..12],
        &compact[12..16],
        &compact[16..20],
        &compact[20..]
    )
}
