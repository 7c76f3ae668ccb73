//! Scripted backend used by the provider tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use goal_cascade_llm::{
    LlmError, LlmProvider, LlmRequestOptions, LlmResponse, LlmResult, Message, ProviderConfig,
};

/// Pops one scripted answer per request and records what was asked.
pub struct ScriptedLlm {
    responses: Mutex<Vec<LlmResult<String>>>,
    requests: Mutex<Vec<(Vec<Message>, LlmRequestOptions)>>,
    config: ProviderConfig,
}

impl ScriptedLlm {
    pub fn new(mut responses: Vec<LlmResult<String>>) -> Arc<Self> {
        responses.reverse();
        Arc::new(Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
            config: ProviderConfig::default(),
        })
    }

    /// Text of every request's last message, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(messages, _)| messages.last().map(|m| m.text_content()).unwrap_or_default())
            .collect()
    }

    pub fn requests(&self) -> Vec<(Vec<Message>, LlmRequestOptions)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn supports_multimodal(&self) -> bool {
        true
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        _system: Option<String>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        self.requests
            .lock()
            .unwrap()
            .push((messages, request_options));
        let next = self.responses.lock().unwrap().pop().unwrap_or_else(|| {
            Err(LlmError::Other {
                message: "no scripted response left".to_string(),
            })
        });
        next.map(|text| LlmResponse::from_text(text, "scripted"))
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}
