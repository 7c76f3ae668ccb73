//! OpenAI-compatible Provider
//!
//! Implementation of the LlmProvider trait for any endpoint speaking the
//! OpenAI chat-completions protocol (OpenAI itself, DashScope compatible
//! mode, local gateways). Supports JSON mode, image inputs and SSE streaming.

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;

use super::provider::{missing_api_key_error, parse_http_error, LlmProvider};
use super::types::{
    LlmError, LlmRequestOptions, LlmResponse, LlmResult, Message, MessageContent, MessageRole,
    ProviderConfig, StopReason, StreamEvent, UsageStats,
};
use crate::http_client::build_http_client;
use crate::streaming_adapters::{OpenAICompatAdapter, SseLineBuffer};

/// Default OpenAI API base
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// OpenAI-compatible provider
pub struct OpenAIProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl OpenAIProvider {
    /// Create a new provider with the given configuration
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let client = build_http_client(config.request_timeout_secs)?;
        Ok(Self { config, client })
    }

    /// Full chat-completions endpoint for the configured base URL
    pub fn endpoint(&self) -> String {
        let base = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(OPENAI_API_BASE)
            .trim_end_matches('/');
        if base.ends_with(CHAT_COMPLETIONS_PATH) {
            base.to_string()
        } else {
            format!("{}{}", base, CHAT_COMPLETIONS_PATH)
        }
    }

    fn api_key(&self) -> LlmResult<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| missing_api_key_error("openai"))
    }

    /// Build the request body for the API
    fn build_request_body(
        &self,
        messages: &[Message],
        system: Option<&str>,
        stream: bool,
        request_options: &LlmRequestOptions,
    ) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": request_options
                .max_tokens_override
                .unwrap_or(self.config.max_tokens),
            "temperature": request_options
                .temperature_override
                .unwrap_or(self.config.temperature),
            "stream": stream,
        });

        if let Some(top_p) = request_options.top_p {
            body["top_p"] = serde_json::json!(top_p);
        }

        if request_options.json_mode {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        let mut openai_messages: Vec<serde_json::Value> = Vec::new();

        if let Some(sys) = system {
            openai_messages.push(serde_json::json!({
                "role": "system",
                "content": sys
            }));
        }

        for msg in messages {
            openai_messages.push(Self::message_to_openai(msg));
        }

        body["messages"] = serde_json::json!(openai_messages);

        if stream {
            body["stream_options"] = serde_json::json!({
                "include_usage": true
            });
        }

        body
    }

    /// Convert a Message to OpenAI API format
    fn message_to_openai(message: &Message) -> serde_json::Value {
        let role = match message.role {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        };

        if message.has_images() {
            let content_parts: Vec<serde_json::Value> = message
                .content
                .iter()
                .map(|c| match c {
                    MessageContent::Text { text } => serde_json::json!({
                        "type": "text",
                        "text": text
                    }),
                    MessageContent::Image { media_type, data } => serde_json::json!({
                        "type": "image_url",
                        "image_url": {
                            "url": format!("data:{};base64,{}", media_type, data),
                            "detail": "high"
                        }
                    }),
                })
                .collect();

            return serde_json::json!({
                "role": role,
                "content": content_parts
            });
        }

        serde_json::json!({
            "role": role,
            "content": message.text_content()
        })
    }

    /// Parse a non-streaming response
    fn parse_response(response: OpenAIResponse) -> LlmResponse {
        let choice = response.choices.into_iter().next();

        let stop_reason = choice
            .as_ref()
            .and_then(|c| c.finish_reason.as_deref())
            .map(StopReason::from)
            .unwrap_or(StopReason::EndTurn);

        let content = choice.and_then(|c| c.message).and_then(|m| m.content);

        let usage = response
            .usage
            .map(|u| UsageStats {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        LlmResponse {
            content,
            stop_reason,
            usage,
            model: response.model,
        }
    }

    async fn post(&self, body: &serde_json::Value) -> LlmResult<reqwest::Response> {
        let api_key = self.api_key()?;
        let endpoint = self.endpoint();
        tracing::debug!(endpoint = %endpoint, model = %self.config.model, "sending chat completion request");

        self.client
            .post(&endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &'static str {
        "openai"
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
        system: Option<String>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let body = self.build_request_body(&messages, system.as_deref(), false, &request_options);
        let response = self.post(&body).await?;

        let status = response.status().as_u16();
        let body_text = response.text().await.map_err(|e| LlmError::NetworkError {
            message: e.to_string(),
        })?;

        if status != 200 {
            return Err(parse_http_error(status, &body_text, "openai"));
        }

        let openai_response: OpenAIResponse =
            serde_json::from_str(&body_text).map_err(|e| LlmError::ParseError {
                message: format!("Failed to parse response: {}", e),
            })?;

        Ok(Self::parse_response(openai_response))
    }

    async fn stream_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        tx: mpsc::Sender<String>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let body = self.build_request_body(&messages, system.as_deref(), true, &request_options);
        let response = self.post(&body).await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body_text = response.text().await.map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;
            return Err(parse_http_error(status, &body_text, "openai"));
        }

        let mut adapter = OpenAICompatAdapter::new();
        let mut state = StreamState::default();
        let mut lines = SseLineBuffer::new();
        let mut receiver_gone = false;

        let mut stream = response.bytes_stream();

        'outer: while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;

            for line in lines.push(&chunk) {
                if !forward_line(&line, &mut adapter, &mut state, &tx).await {
                    receiver_gone = true;
                    break 'outer;
                }
            }
        }

        if receiver_gone {
            tracing::debug!("stream receiver dropped, cancelling request");
        } else if let Some(line) = lines.finish() {
            // final line without a trailing newline
            forward_line(&line, &mut adapter, &mut state, &tx).await;
        }

        Ok(state.into_response(self.config.model.clone()))
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

/// Text, usage and stop reason gathered while streaming.
#[derive(Debug)]
struct StreamState {
    content: String,
    usage: UsageStats,
    stop_reason: StopReason,
}

impl Default for StreamState {
    fn default() -> Self {
        Self {
            content: String::new(),
            usage: UsageStats::default(),
            stop_reason: StopReason::EndTurn,
        }
    }
}

impl StreamState {
    fn into_response(self, model: String) -> LlmResponse {
        LlmResponse {
            content: (!self.content.is_empty()).then_some(self.content),
            stop_reason: self.stop_reason,
            usage: self.usage,
            model,
        }
    }
}

/// Feed one SSE line through the adapter and forward text deltas.
///
/// Returns `false` once the receiver has been dropped.
async fn forward_line(
    line: &str,
    adapter: &mut OpenAICompatAdapter,
    state: &mut StreamState,
    tx: &mpsc::Sender<String>,
) -> bool {
    let events = match adapter.adapt(line) {
        Ok(events) => events,
        Err(e) => {
            tracing::warn!(error = %e, "skipping malformed stream chunk");
            return true;
        }
    };

    for event in events {
        match event {
            StreamEvent::TextDelta { content } => {
                state.content.push_str(&content);
                if tx.send(content).await.is_err() {
                    return false;
                }
            }
            StreamEvent::Usage {
                input_tokens,
                output_tokens,
            } => {
                state.usage = UsageStats {
                    input_tokens,
                    output_tokens,
                };
            }
            StreamEvent::Complete {
                stop_reason: Some(reason),
            } => {
                state.stop_reason = StopReason::from(reason.as_str());
            }
            StreamEvent::Complete { stop_reason: None } => {}
        }
    }
    true
}

/// OpenAI API response format
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<ResponseUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
