//! Backend glue shared by the built-in providers.

use std::sync::Arc;

use goal_cascade_core::{CoreError, CoreResult, ToolCredentials};
use goal_cascade_llm::{LlmError, LlmProvider, OpenAIProvider, ProviderConfig};

/// Build an OpenAI-compatible backend from per-task credentials.
///
/// A configured request timeout replaces the provider default; `0`
/// disables it.
pub fn backend_from_credentials(credentials: &ToolCredentials) -> CoreResult<Arc<dyn LlmProvider>> {
    let mut config = ProviderConfig::from_credentials(
        &credentials.api_key,
        &credentials.base_url,
        &credentials.model,
    );
    if let Some(secs) = credentials.request_timeout_secs {
        config.request_timeout_secs = Some(secs).filter(|secs| *secs > 0);
    }
    let provider = OpenAIProvider::new(config).map_err(llm_error)?;
    Ok(Arc::new(provider))
}

/// Convert a backend failure into the tool-boundary error.
pub fn llm_error(err: LlmError) -> CoreError {
    CoreError::tool(err.to_string())
}
