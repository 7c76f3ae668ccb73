//! Settings Models
//!
//! Configuration data structures loaded from `config/config.toml`.

use std::collections::HashMap;

use goal_cascade_core::PageConfig;
use serde::{Deserialize, Serialize};

/// Default OpenAI-compatible endpoint (DashScope compatible mode)
pub const DEFAULT_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";

/// Page whose credentials and model the planner uses
pub const DEFAULT_PLANNER_PAGE: &str = "mcp_agent";

/// Application configuration stored in config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub planner: PlannerSettings,
    #[serde(default)]
    pub executor: ExecutorSettings,
    #[serde(default)]
    pub security: SecuritySettings,
    /// Per-page settings keyed by page name
    #[serde(default)]
    pub pages: HashMap<String, PageConfig>,
    /// Tool catalog entries keyed by logical tool name, in file order
    #[serde(default)]
    pub tools: toml::Table,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_title() -> String {
    "Goal Cascade".to_string()
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            title: default_title(),
            description: None,
        }
    }
}

/// Backend credentials and endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Let OPENAI_API_KEY / API_KEY / OPENAI_API_BASE / API_BASE_URL win
    #[serde(default = "default_true")]
    pub use_environment_variables: bool,
    #[serde(default)]
    pub default_api_key: String,
    #[serde(default = "default_base_url")]
    pub default_base_url: String,
    /// Whole-request HTTP timeout for backend calls
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Known endpoints with their own keys
    #[serde(default)]
    pub alternative_base_urls: Vec<AlternativeBaseUrl>,
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            use_environment_variables: true,
            default_api_key: String::new(),
            default_base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            alternative_base_urls: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeBaseUrl {
    #[serde(default)]
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub api_key: String,
}

/// Plan generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerSettings {
    #[serde(default = "default_planner_page")]
    pub page: String,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_planner_temperature")]
    pub temperature: f32,
    /// Fixed pause between attempts (0 = retry immediately)
    #[serde(default)]
    pub retry_delay_ms: u64,
}

fn default_planner_page() -> String {
    DEFAULT_PLANNER_PAGE.to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_planner_temperature() -> f32 {
    0.1
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            page: default_planner_page(),
            max_attempts: default_max_attempts(),
            temperature: default_planner_temperature(),
            retry_delay_ms: 0,
        }
    }
}

/// Plan execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorSettings {
    /// Per-task timeout in seconds (0 disables)
    #[serde(default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,
}

fn default_task_timeout_secs() -> u64 {
    300
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            task_timeout_secs: default_task_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecuritySettings {
    #[serde(default = "default_true")]
    pub mask_api_key_display: bool,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            mask_api_key_display: true,
        }
    }
}

impl AppConfig {
    /// Validate structural constraints
    pub fn validate(&self) -> Result<(), String> {
        if self.planner.max_attempts == 0 {
            return Err("planner.max_attempts must be at least 1".to_string());
        }

        if !(0.0..=2.0).contains(&self.planner.temperature) {
            return Err(format!(
                "Invalid planner.temperature: {}. Must be between 0.0 and 2.0",
                self.planner.temperature
            ));
        }

        if self.planner.page.trim().is_empty() {
            return Err("planner.page must not be empty".to_string());
        }

        for entry in &self.api.alternative_base_urls {
            if entry.url.trim().is_empty() {
                return Err(format!(
                    "api.alternative_base_urls entry '{}' has an empty url",
                    entry.name
                ));
            }
        }

        Ok(())
    }
}
