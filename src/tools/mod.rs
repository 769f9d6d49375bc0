//! Tool surface over the plugin registry
//!
//! [`catalog`] derives a deterministic tool list from registered plugins,
//! [`matcher`] routes user queries to a tool with an ordered keyword table,
//! and [`entities`] remembers per-session entities between turns.

pub mod catalog;
pub mod entities;
pub mod matcher;

pub use catalog::{ToolCatalog, ToolDescriptor, ToolKey};
pub use entities::{ChatMessage, EntityKind, SessionEntityStore, extract_device_id};
pub use matcher::{MatchOutcome, MatchRule, OperationKind, ToolMatcher, default_rules};
