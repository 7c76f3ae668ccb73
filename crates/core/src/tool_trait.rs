//! Tool Trait and Catalog
//!
//! - `Tool` - the fixed interface every capability provider implements
//! - `ToolCredentials` - what a provider is constructed from
//! - `ToolSpec` - catalog entry binding a logical tool name to a provider
//! - `ToolCatalog` - O(1) lookup with ordered iteration
//!
//! Logical tool names are what plans reference. A catalog entry maps a name
//! to a provider identifier (resolved through the provider registry in
//! `goal-cascade-tools`) and a configuration page key (resolved through the
//! `ConfigProvider`).

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::TaskContext;
use crate::error::CoreResult;

// ============================================================================
// Trait Definitions
// ============================================================================

/// Credentials and model resolved for one task execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCredentials {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    /// HTTP request timeout for the tool's backend. `None` keeps the
    /// backend default and `Some(0)` disables the timeout.
    pub request_timeout_secs: Option<u64>,
}

impl ToolCredentials {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
            request_timeout_secs: None,
        }
    }

    pub fn with_request_timeout(mut self, secs: Option<u64>) -> Self {
        self.request_timeout_secs = secs;
        self
    }
}

/// Capability provider interface.
///
/// A fresh instance is constructed for every task, so implementations may
/// hold per-task state without synchronization.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Provider identifier (e.g. "travel_planner").
    fn name(&self) -> &str;

    /// Perform the task described by `description`.
    ///
    /// `context` carries caller data plus `"<task_id>_result"` entries for
    /// every dependency that already succeeded.
    async fn execute(&self, description: &str, context: &TaskContext) -> CoreResult<String>;
}

// ============================================================================
// ToolCatalog
// ============================================================================

/// One logical tool as seen by the planner and the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Logical tool name referenced by plan tasks
    #[serde(default)]
    pub name: String,
    /// Human description shown to the planning model
    pub description: String,
    /// Capability provider identifier
    pub provider: String,
    /// Configuration page key used for credentials and model lookup
    pub page: String,
}

impl ToolSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        provider: impl Into<String>,
        page: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            provider: provider.into(),
            page: page.into(),
        }
    }
}

/// Static catalog of available tools.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: HashMap<String, ToolSpec>,
    /// Insertion order for deterministic iteration.
    order: Vec<String>,
}

impl ToolCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from specs, keeping their order.
    pub fn from_specs(specs: impl IntoIterator<Item = ToolSpec>) -> Self {
        let mut catalog = Self::new();
        for spec in specs {
            catalog.register(spec);
        }
        catalog
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, spec: ToolSpec) {
        let name = spec.name.clone();
        if !self.tools.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.tools.insert(name, spec);
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.get(name)
    }

    /// Check if a tool is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All tool names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Iterate over specs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ToolSpec> {
        self.order.iter().filter_map(|name| self.tools.get(name))
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// One `- name: description` line per tool, for prompts.
    pub fn prompt_listing(&self) -> String {
        self.iter()
            .map(|spec| format!("- {}: {}\n", spec.name, spec.description))
            .collect()
    }
}
