//! OpenAI-compatible SSE Stream Adapter
//!
//! Handles the `data: {...}` chunk format shared by OpenAI and DashScope
//! compatible-mode endpoints. Reasoning deltas (`reasoning_content`) are
//! dropped; only answer text is surfaced.

use serde::Deserialize;

use crate::types::{LlmError, StreamEvent};

#[derive(Debug, Deserialize)]
struct ChunkEvent {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Option<Delta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// Adapter for OpenAI-compatible chat completion streams
#[derive(Debug, Default)]
pub struct OpenAICompatAdapter {
    finished: bool,
}

impl OpenAICompatAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a terminal event (`finish_reason` or `[DONE]`) has been seen.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Adapt one SSE line.
    pub fn adapt(&mut self, input: &str) -> Result<Vec<StreamEvent>, LlmError> {
        let trimmed = input.trim();

        if trimmed.is_empty() || trimmed.starts_with(':') {
            return Ok(vec![]);
        }

        let json_str = match trimmed.strip_prefix("data:") {
            Some(rest) => rest.trim_start(),
            // event:/id:/retry: fields carry nothing we use
            None if trimmed.contains(':') && !trimmed.starts_with('{') => return Ok(vec![]),
            None => trimmed,
        };

        if json_str.is_empty() {
            return Ok(vec![]);
        }

        if json_str == "[DONE]" {
            if self.finished {
                return Ok(vec![]);
            }
            self.finished = true;
            return Ok(vec![StreamEvent::Complete { stop_reason: None }]);
        }

        let event: ChunkEvent =
            serde_json::from_str(json_str).map_err(|e| LlmError::ParseError {
                message: format!("invalid stream chunk: {}", e),
            })?;

        let mut events = vec![];

        for choice in event.choices {
            if let Some(content) = choice.delta.and_then(|d| d.content) {
                if !content.is_empty() {
                    events.push(StreamEvent::TextDelta { content });
                }
            }
            if let Some(finish_reason) = choice.finish_reason {
                self.finished = true;
                events.push(StreamEvent::Complete {
                    stop_reason: Some(finish_reason),
                });
            }
        }

        if let Some(usage) = event.usage {
            events.push(StreamEvent::Usage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            });
        }

        Ok(events)
    }

    pub fn reset(&mut self) {
        self.finished = false;
    }
}
