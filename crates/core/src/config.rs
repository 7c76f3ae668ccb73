//! Configuration Collaborator
//!
//! The narrow configuration interface the orchestrator consumes. Concrete
//! implementations (file-backed, environment-backed, test doubles) live
//! outside the core crate.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreResult;

/// Baseline model used when a page does not configure `default_model`.
pub const BASELINE_MODEL: &str = "qwen-turbo";

/// Per-page settings.
///
/// A "page" is a configuration scope keyed by name (e.g. `travel_agent`,
/// `image_recognition`). Tools resolve their credentials and model through
/// the page they are bound to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Model used for tasks bound to this page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    /// Page-specific API key (overrides the global default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Page-specific base URL (overrides the global default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Any other page settings, kept verbatim
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

impl PageConfig {
    /// The configured model, or the baseline model.
    pub fn model_or_baseline(&self) -> String {
        self.default_model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(BASELINE_MODEL)
            .to_string()
    }
}

/// Configuration collaborator consumed by the executor.
///
/// Implementations are long-lived and shared read-only across runs.
pub trait ConfigProvider: Send + Sync {
    /// API key for the given page. An empty string means "not configured".
    fn api_key(&self, page: &str) -> CoreResult<String>;

    /// Base endpoint URL for the given page.
    fn base_url(&self, page: &str) -> CoreResult<String>;

    /// Full page settings.
    fn page_config(&self, page: &str) -> CoreResult<PageConfig>;

    /// HTTP request timeout handed to tool backends. `None` keeps the
    /// backend default.
    fn request_timeout_secs(&self) -> Option<u64> {
        None
    }
}
