//! Stream Adapters
//!
//! Turn raw SSE bytes into lines and lines into `StreamEvent`s.

pub mod line_buffer;
pub mod openai_compat;

pub use line_buffer::SseLineBuffer;
pub use openai_compat::OpenAICompatAdapter;
