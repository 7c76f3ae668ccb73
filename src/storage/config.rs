//! TOML Configuration Management
//!
//! Loads `config/config.toml` and resolves per-page credentials with
//! environment overrides. `ConfigManager` is the application's
//! `ConfigProvider`.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use goal_cascade_core::{
    ConfigProvider, CoreError, CoreResult, PageConfig, ToolCatalog, ToolCredentials, ToolSpec,
    BASELINE_MODEL,
};

use crate::models::settings::AppConfig;
use crate::utils::error::{AppError, AppResult};

/// Config file used when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

const API_KEY_VARS: [&str; 2] = ["OPENAI_API_KEY", "API_KEY"];
const BASE_URL_VARS: [&str; 2] = ["OPENAI_API_BASE", "API_BASE_URL"];

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// File-backed configuration with environment overrides
#[derive(Clone)]
pub struct ConfigManager {
    path: Option<PathBuf>,
    config: AppConfig,
    env: EnvLookup,
}

impl fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigManager")
            .field("path", &self.path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl ConfigManager {
    /// Wrap an in-memory configuration. Environment variables are read from
    /// the process environment.
    pub fn new(config: AppConfig) -> Self {
        Self {
            path: None,
            config,
            env: Arc::new(|name| std::env::var(name).ok()),
        }
    }

    /// Load configuration from a file. A missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let config = if path.exists() {
            let content = fs::read_to_string(path)?;
            let config = Self::parse(&content)?;
            tracing::info!(path = %path.display(), "configuration loaded");
            config
        } else {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            AppConfig::default()
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            ..Self::new(config)
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        Ok(Self::new(Self::parse(content)?))
    }

    fn parse(content: &str) -> AppResult<AppConfig> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate().map_err(AppError::validation)?;
        Ok(config)
    }

    /// Replace the environment lookup (used by tests)
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(lookup);
        self
    }

    /// Path the configuration was loaded from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Get the current configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// First non-empty environment variable among `names`
    fn env_override(&self, names: &[&str]) -> Option<String> {
        if !self.config.api.use_environment_variables {
            return None;
        }
        names
            .iter()
            .filter_map(|name| (self.env)(name))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
    }

    fn page(&self, page: &str) -> Option<&PageConfig> {
        self.config.pages.get(page)
    }

    /// API key for a page: environment, page, matching alternative base URL,
    /// then the global default. May be empty.
    pub fn resolve_api_key(&self, page: &str) -> String {
        if let Some(key) = self.env_override(&API_KEY_VARS) {
            return key;
        }

        if let Some(key) = self
            .page(page)
            .and_then(|p| p.api_key.as_deref())
            .filter(|k| !k.trim().is_empty())
        {
            return key.to_string();
        }

        let base_url = self.resolve_base_url(page);
        if let Some(entry) = self
            .config
            .api
            .alternative_base_urls
            .iter()
            .find(|entry| entry.url == base_url && !entry.api_key.trim().is_empty())
        {
            return entry.api_key.clone();
        }

        self.config.api.default_api_key.clone()
    }

    /// Base URL for a page: environment, page, then the global default.
    pub fn resolve_base_url(&self, page: &str) -> String {
        if let Some(url) = self.env_override(&BASE_URL_VARS) {
            return url;
        }

        if let Some(url) = self
            .page(page)
            .and_then(|p| p.base_url.as_deref())
            .filter(|u| !u.trim().is_empty())
        {
            return url.to_string();
        }

        self.config.api.default_base_url.clone()
    }

    /// Model configured for a page, or the baseline model
    pub fn resolve_model(&self, page: &str) -> String {
        self.page(page)
            .map(PageConfig::model_or_baseline)
            .unwrap_or_else(|| BASELINE_MODEL.to_string())
    }

    /// Credentials for a page
    pub fn credentials(&self, page: &str) -> ToolCredentials {
        ToolCredentials::new(
            self.resolve_api_key(page),
            self.resolve_base_url(page),
            self.resolve_model(page),
        )
        .with_request_timeout(Some(self.config.api.request_timeout_secs))
    }

    /// Credentials used by the plan generator
    pub fn planner_credentials(&self) -> ToolCredentials {
        self.credentials(&self.config.planner.page)
    }

    /// Tool catalog from `[tools]`, or `default` when none are configured
    pub fn tool_catalog_or(&self, default: ToolCatalog) -> AppResult<ToolCatalog> {
        if self.config.tools.is_empty() {
            return Ok(default);
        }

        let mut catalog = ToolCatalog::new();
        for (name, value) in &self.config.tools {
            let mut spec: ToolSpec = value.clone().try_into().map_err(|e: toml::de::Error| {
                AppError::config(format!("invalid [tools.{}] entry: {}", name, e))
            })?;
            if spec.name.trim().is_empty() {
                spec.name = name.clone();
            }
            catalog.register(spec);
        }
        Ok(catalog)
    }

    /// Tool catalog from `[tools]`, or the built-in catalog
    pub fn tool_catalog(&self) -> AppResult<ToolCatalog> {
        self.tool_catalog_or(goal_cascade_tools::default_catalog())
    }

    /// Problems that would prevent a run from reaching the backend
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if let Err(e) = self.config.validate() {
            problems.push(e);
        }

        if self.resolve_base_url(&self.config.planner.page).trim().is_empty() {
            problems.push("api.default_base_url is not configured".to_string());
        }

        if self.resolve_api_key(&self.config.planner.page).trim().is_empty() {
            problems.push(
                "no API key configured; set api.default_api_key or OPENAI_API_KEY".to_string(),
            );
        }

        match self.tool_catalog() {
            Ok(catalog) => {
                for spec in catalog.iter() {
                    if spec.provider.trim().is_empty() {
                        problems.push(format!("tool '{}' has no provider", spec.name));
                    }
                    if spec.page.trim().is_empty() {
                        problems.push(format!("tool '{}' has no page", spec.name));
                    }
                }
            }
            Err(e) => problems.push(e.to_string()),
        }

        problems
    }

    /// Mask an API key for display, keeping the first and last four chars
    pub fn mask_api_key(&self, api_key: &str) -> String {
        if api_key.is_empty() || !self.config.security.mask_api_key_display {
            return api_key.to_string();
        }

        let chars: Vec<char> = api_key.chars().collect();
        if chars.len() <= 8 {
            return "*".repeat(chars.len());
        }

        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
    }
}

impl ConfigProvider for ConfigManager {
    fn api_key(&self, page: &str) -> CoreResult<String> {
        Ok(self.resolve_api_key(page))
    }

    fn base_url(&self, page: &str) -> CoreResult<String> {
        Ok(self.resolve_base_url(page))
    }

    fn page_config(&self, page: &str) -> CoreResult<PageConfig> {
        self.page(page)
            .cloned()
            .ok_or_else(|| CoreError::not_found(format!("page '{}' is not configured", page)))
    }

    fn request_timeout_secs(&self) -> Option<u64> {
        Some(self.config.api.request_timeout_secs)
    }
}
