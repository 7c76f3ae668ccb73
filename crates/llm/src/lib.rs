//! Goal Cascade LLM
//!
//! Provides a unified interface for talking to generative backends that
//! speak the OpenAI chat-completions protocol (OpenAI, DashScope compatible
//! mode and local gateways).
//!
//! Also includes the SSE streaming adapter and the HTTP client factory.

pub mod http_client;
pub mod openai;
pub mod provider;
pub mod streaming_adapters;
pub mod types;

// Re-export main types
pub use http_client::build_http_client;
pub use openai::{OpenAIProvider, OPENAI_API_BASE};
pub use provider::{missing_api_key_error, parse_http_error, LlmProvider};
pub use types::*;

pub use streaming_adapters::{OpenAICompatAdapter, SseLineBuffer};
