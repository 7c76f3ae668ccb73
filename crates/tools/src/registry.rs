//! Provider Registry
//!
//! Maps capability-provider identifiers to constructor functions. The
//! executor asks the registry for a fresh `Box<dyn Tool>` per task; nothing
//! is pooled or reused between tasks.

use std::collections::HashMap;
use std::sync::Arc;

use goal_cascade_core::{CoreError, CoreResult, Tool, ToolCatalog, ToolCredentials, ToolSpec};

use crate::readme_viewer::ReadmeViewer;
use crate::travel_planner::TravelPlanner;
use crate::vision_analyzer::VisionAnalyzer;

/// Provider id of the itinerary planner.
pub const TRAVEL_PLANNER: &str = "travel_planner";
/// Provider id of the image analyzer.
pub const VISION_ANALYZER: &str = "vision_analyzer";
/// Provider id of the README viewer.
pub const README_VIEWER: &str = "readme_viewer";

/// Constructor that builds a tool instance from resolved credentials.
pub type ToolConstructor = Arc<dyn Fn(ToolCredentials) -> CoreResult<Box<dyn Tool>> + Send + Sync>;

/// Registry of tool constructors keyed by provider id.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    constructors: HashMap<String, ToolConstructor>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in providers.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(TRAVEL_PLANNER, |creds| {
            Ok(Box::new(TravelPlanner::from_credentials(&creds)?) as Box<dyn Tool>)
        });
        registry.register(VISION_ANALYZER, |creds| {
            Ok(Box::new(VisionAnalyzer::from_credentials(&creds)?) as Box<dyn Tool>)
        });
        registry.register(README_VIEWER, |_creds| {
            Ok(Box::new(ReadmeViewer::new()) as Box<dyn Tool>)
        });
        registry
    }

    /// Register a constructor. Replaces any existing one with the same id.
    pub fn register<F>(&mut self, provider: impl Into<String>, constructor: F)
    where
        F: Fn(ToolCredentials) -> CoreResult<Box<dyn Tool>> + Send + Sync + 'static,
    {
        self.constructors
            .insert(provider.into(), Arc::new(constructor));
    }

    /// Check if a provider id is registered.
    pub fn contains(&self, provider: &str) -> bool {
        self.constructors.contains_key(provider)
    }

    /// Registered provider ids, sorted.
    pub fn providers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.constructors.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Construct a fresh tool for `provider`.
    pub fn construct(&self, provider: &str, credentials: ToolCredentials) -> CoreResult<Box<dyn Tool>> {
        let constructor = self.constructors.get(provider).ok_or_else(|| {
            CoreError::not_found(format!(
                "no capability provider registered for '{}'",
                provider
            ))
        })?;
        constructor(credentials)
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}

/// Catalog used when the configuration declares no tools.
pub fn default_catalog() -> ToolCatalog {
    ToolCatalog::from_specs(vec![
        ToolSpec::new(
            TRAVEL_PLANNER,
            "Creates a day-by-day travel itinerary for a destination and number of days (attractions, food, lodging, transport, budget).",
            TRAVEL_PLANNER,
            "travel_agent",
        ),
        ToolSpec::new(
            VISION_ANALYZER,
            "Analyzes the image given by `image_path` in the context and describes its content; supports simple, detailed and comprehensive analysis.",
            VISION_ANALYZER,
            "image_recognition",
        ),
        ToolSpec::new(
            README_VIEWER,
            "Shows the project README or answers requests about it.",
            README_VIEWER,
            "readme",
        ),
    ])
}
