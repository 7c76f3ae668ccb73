//! Vision Analyzer
//!
//! Describes the image referenced by `image_path` in the task context using
//! a multimodal backend.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;

use goal_cascade_core::{CoreError, CoreResult, TaskContext, Tool, ToolCredentials};
use goal_cascade_llm::{LlmProvider, LlmRequestOptions, Message};

use crate::backend::{backend_from_credentials, llm_error};
use crate::registry::VISION_ANALYZER;

/// Context key holding the image to analyze.
pub const IMAGE_PATH_KEY: &str = "image_path";

const ANALYSIS_TEMPERATURE: f32 = 0.3;
const ANALYSIS_TOP_P: f32 = 0.9;
const ANALYSIS_MAX_TOKENS: u32 = 4096;

/// Depth of the requested analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    Simple,
    Detailed,
    Comprehensive,
}

impl AnalysisMode {
    /// Pick the mode from keywords in the task description.
    pub fn from_description(description: &str) -> Self {
        let lower = description.to_lowercase();
        if ["简单", "简洁", "simple"].iter().any(|k| lower.contains(k)) {
            AnalysisMode::Simple
        } else if ["详细", "detailed"].iter().any(|k| lower.contains(k)) {
            AnalysisMode::Detailed
        } else {
            AnalysisMode::Comprehensive
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::Simple => "simple",
            AnalysisMode::Detailed => "detailed",
            AnalysisMode::Comprehensive => "comprehensive",
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            AnalysisMode::Simple => {
                "You are an image recognition assistant. Describe the main content of the image concisely and accurately: the main objects, the scene and the key features. Keep it short and lead with what matters most."
            }
            AnalysisMode::Detailed => {
                "You are an expert image analyst. Produce an in-depth report covering:\n1. Visual elements\n2. Scene and environment\n3. Technical parameters (if visible)\n4. Artistic and aesthetic evaluation\n5. Possible purpose and meaning\n6. Suggestions for improvement (if applicable)\nUse precise terminology and a structured layout."
            }
            AnalysisMode::Comprehensive => {
                "You are a professional image analyst with a sharp eye and broad background knowledge. Analyze the image thoroughly: main objects and elements, scene, color, lighting and composition; visual style and aesthetics; important details, context and any implied meaning. Use Markdown with clear sections."
            }
        }
    }

    fn user_prompt(&self, description: &str) -> String {
        format!(
            "Perform a {} analysis of this image.\n\nTask: {}\n\nIdentify all important elements, use a clear structure and give useful insights. Answer in the language of the task.",
            self.as_str(),
            description
        )
    }
}

/// MIME type inferred from the file extension.
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "image/jpeg",
    }
}

/// Image analyzer backed by a multimodal backend.
pub struct VisionAnalyzer {
    llm: Arc<dyn LlmProvider>,
}

impl VisionAnalyzer {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    pub fn from_credentials(credentials: &ToolCredentials) -> CoreResult<Self> {
        Ok(Self::new(backend_from_credentials(credentials)?))
    }
}

#[async_trait]
impl Tool for VisionAnalyzer {
    fn name(&self) -> &str {
        VISION_ANALYZER
    }

    async fn execute(&self, description: &str, context: &TaskContext) -> CoreResult<String> {
        let image_path = context
            .get_str(IMAGE_PATH_KEY)
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| {
                CoreError::validation(format!(
                    "no image path ('{}') found in the task context",
                    IMAGE_PATH_KEY
                ))
            })?;

        let path = Path::new(image_path);
        let bytes = tokio::fs::read(path).await?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        let mode = AnalysisMode::from_description(description);

        tracing::info!(
            image = %path.display(),
            bytes = bytes.len(),
            mode = mode.as_str(),
            "vision analyzer executing"
        );

        let message = Message::user_with_image(mode.user_prompt(description), mime_type_for(path), encoded);
        let options = LlmRequestOptions::text(ANALYSIS_TEMPERATURE)
            .with_top_p(ANALYSIS_TOP_P)
            .with_max_tokens(ANALYSIS_MAX_TOKENS);

        let response = self
            .llm
            .send_message(vec![message], Some(mode.system_prompt().to_string()), options)
            .await
            .map_err(llm_error)?;

        response.text().map_err(llm_error)
    }
}
