//! Test doubles shared by the integration tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use goal_cascade_core::{
    ConfigProvider, CoreError, CoreResult, PageConfig, TaskContext, Tool, ToolCatalog, ToolSpec,
};
use goal_cascade_llm::{
    LlmError, LlmProvider, LlmRequestOptions, LlmResponse, LlmResult, Message, ProviderConfig,
};
use goal_cascade_tools::ProviderRegistry;

/// Planning backend that answers with predefined texts in order.
pub struct MockLlmProvider {
    responses: Mutex<Vec<LlmResult<String>>>,
    calls: Mutex<Vec<Vec<Message>>>,
    config: ProviderConfig,
}

impl MockLlmProvider {
    pub fn new(responses: Vec<LlmResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses),
            calls: Mutex::new(Vec::new()),
            config: ProviderConfig::default(),
        })
    }

    pub fn with_texts(texts: &[&str]) -> Arc<Self> {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        _system: Option<String>,
        _request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        self.calls.lock().unwrap().push(messages);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(LlmError::Other {
                message: "No more mock responses available".to_string(),
            });
        }
        responses
            .remove(0)
            .map(|text| LlmResponse::from_text(text, "mock-model"))
    }
}

/// Configuration double with fixed credentials and optional pages.
#[derive(Default)]
pub struct StaticConfig {
    pub pages: HashMap<String, PageConfig>,
}

impl ConfigProvider for StaticConfig {
    fn api_key(&self, _page: &str) -> CoreResult<String> {
        Ok("sk-integration".to_string())
    }

    fn base_url(&self, _page: &str) -> CoreResult<String> {
        Ok("http://127.0.0.1:9".to_string())
    }

    fn page_config(&self, page: &str) -> CoreResult<PageConfig> {
        self.pages
            .get(page)
            .cloned()
            .ok_or_else(|| CoreError::not_found(format!("page '{}'", page)))
    }
}

/// Records every (description, context) it receives.
pub type Calls = Arc<Mutex<Vec<(String, TaskContext)>>>;

/// Tool returning scripted results keyed by description.
pub struct ScriptedTool {
    results: HashMap<String, Result<String, String>>,
    calls: Calls,
}

#[async_trait]
impl Tool for ScriptedTool {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn execute(&self, description: &str, context: &TaskContext) -> CoreResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push((description.to_string(), context.clone()));
        match self.results.get(description) {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(message)) => Err(CoreError::tool(message.clone())),
            None => Ok(format!("done: {}", description)),
        }
    }
}

/// Catalog with the two logical tools plans usually reference.
pub fn catalog() -> Arc<ToolCatalog> {
    Arc::new(ToolCatalog::from_specs(vec![
        ToolSpec::new("travel_planner", "Plans trips", "scripted", "travel_agent"),
        ToolSpec::new("vision_analyzer", "Analyzes images", "scripted", "image_recognition"),
    ]))
}

/// Registry whose only provider is a `ScriptedTool` with `results`.
pub fn scripted_registry(results: &[(&str, Result<&str, &str>)]) -> (Arc<ProviderRegistry>, Calls) {
    let results: HashMap<String, Result<String, String>> = results
        .iter()
        .map(|(description, result)| {
            (
                description.to_string(),
                result.map(str::to_string).map_err(str::to_string),
            )
        })
        .collect();
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));

    let mut registry = ProviderRegistry::new();
    let sink = calls.clone();
    registry.register("scripted", move |_creds| {
        Ok(Box::new(ScriptedTool {
            results: results.clone(),
            calls: sink.clone(),
        }) as Box<dyn Tool>)
    });
    (Arc::new(registry), calls)
}
