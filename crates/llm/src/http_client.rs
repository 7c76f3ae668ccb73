//! HTTP Client Factory
//!
//! Provides a factory function for building reqwest clients with an explicit
//! request timeout.

use std::time::Duration;

use crate::types::{LlmError, LlmResult};

/// Build a `reqwest::Client`.
///
/// - `Some(secs)` -> whole-request timeout of `secs` seconds
/// - `None` -> no timeout
pub fn build_http_client(timeout_secs: Option<u64>) -> LlmResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = timeout_secs.filter(|s| *s > 0) {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().map_err(|e| LlmError::Other {
        message: format!("failed to build HTTP client: {}", e),
    })
}
