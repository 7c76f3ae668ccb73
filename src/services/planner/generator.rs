//! LLM-Powered Plan Generation
//!
//! Turns a free-form goal into a validated `Plan` using the planning backend.
//! Each attempt requests strict JSON at a low temperature. When an attempt
//! returns text that does not parse or has the wrong shape, the next attempt
//! carries that text plus a repair prompt naming the error. After the last
//! failed attempt the keyword fallback planner takes over, so generation
//! always yields a non-empty plan.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use goal_cascade_core::{TaskContext, ToolCatalog};
use goal_cascade_llm::{LlmProvider, LlmRequestOptions, Message};

use super::fallback::fallback_plan;
use super::validator::validate_tasks;
use crate::models::plan::Plan;
use crate::models::settings::PlannerSettings;

/// Knobs for plan generation.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerOptions {
    /// Backend attempts before falling back (at least 1)
    pub max_attempts: u32,
    /// Sampling temperature for planning requests
    pub temperature: f32,
    /// Fixed pause between attempts
    pub retry_delay: Duration,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            temperature: 0.1,
            retry_delay: Duration::ZERO,
        }
    }
}

impl From<&PlannerSettings> for PlannerOptions {
    fn from(settings: &PlannerSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            temperature: settings.temperature,
            retry_delay: Duration::from_millis(settings.retry_delay_ms),
        }
    }
}

/// Build the planning prompt.
///
/// Embeds the tool catalog, the serialized context when present, the goal,
/// the output contract and one worked example.
pub fn build_planning_prompt(goal: &str, context: Option<&TaskContext>, catalog: &ToolCatalog) -> String {
    let context_section = match context.filter(|c| !c.is_empty()) {
        Some(ctx) => format!("Initial context: {}\n\n", ctx.to_json_string()),
        None => String::new(),
    };
    let allowed_tools = catalog.names().join(", ");

    format!(
        r#"You are a task orchestrator. Turn the user's goal into an execution plan.

Available tools:
{tools}
{context_section}User goal: "{goal}"

Return exactly one JSON object in this format:

{{
  "plan": [
    {{
      "task_id": "task_1",
      "description": "concrete instruction for the tool",
      "tool": "travel_planner",
      "dependencies": []
    }}
  ]
}}

Requirements:
1. Return a single valid JSON object
2. The top level must have a "plan" key
3. The value of "plan" must be an array
4. Every task must contain all four fields: task_id, description, tool, dependencies
5. "dependencies" must be an array of task_id strings of earlier tasks
6. "tool" must be one of: {allowed_tools}
7. Write descriptions in the language of the user goal

Example for a travel request:
{{
  "plan": [
    {{
      "task_id": "task_1",
      "description": "为合肥的2日游制定详细行程",
      "tool": "travel_planner",
      "dependencies": []
    }}
  ]
}}"#,
        tools = catalog.prompt_listing(),
    )
}

/// Repair prompt sent after an unparseable or malformed response.
pub fn build_repair_prompt(original_response: &str, parse_error: &str) -> String {
    format!(
        "Your previous response could not be used as a plan.\n\n\
         Error: {}\n\n\
         Your previous response was:\n{}\n\n\
         Respond with ONLY a single JSON object with a top-level \"plan\" array. \
         No markdown fences, no explanatory text.",
        parse_error, original_response
    )
}

/// Extract the JSON object from a backend response.
///
/// Text that already parses is returned as-is. Otherwise a Markdown code
/// fence, then the outermost `{...}` span, is tried.
pub fn extract_json_from_response(response_text: &str) -> String {
    let trimmed = response_text.trim();
    let parses = |candidate: &str| serde_json::from_str::<Value>(candidate).is_ok();

    if parses(trimmed) {
        return trimmed.to_string();
    }

    if let Some(fenced) = fenced_block(trimmed).filter(|block| parses(block)) {
        return fenced.to_string();
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start <= end {
            return trimmed[start..=end].to_string();
        }
    }

    trimmed.to_string()
}

/// Body of the first ```json ... ``` or ``` ... ``` block.
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    let content_start = after_fence.find('\n').map(|nl| nl + 1).unwrap_or(0);
    let content = &after_fence[content_start..];
    let end = content.find("```")?;
    Some(content[..end].trim())
}

/// Parse one backend response into a validated plan.
pub fn parse_plan_response(response_text: &str, catalog: &ToolCatalog) -> Result<Plan, String> {
    if response_text.trim().is_empty() {
        return Err("empty response".to_string());
    }

    let json_str = extract_json_from_response(response_text);
    let value: Value =
        serde_json::from_str(&json_str).map_err(|e| format!("invalid JSON: {}", e))?;

    let object = value
        .as_object()
        .ok_or_else(|| "top-level value is not a JSON object".to_string())?;
    let candidates = object
        .get("plan")
        .ok_or_else(|| "missing \"plan\" key".to_string())?
        .as_array()
        .ok_or_else(|| "\"plan\" is not an array".to_string())?;

    let plan = validate_tasks(candidates, catalog);
    if plan.is_empty() {
        return Err(format!(
            "none of the {} tasks were valid (every task needs task_id, description, tool, dependencies and a known tool)",
            candidates.len()
        ));
    }
    Ok(plan)
}

/// Goal → plan generator with retry, repair and fallback.
pub struct PlanGenerator {
    llm: Arc<dyn LlmProvider>,
    catalog: Arc<ToolCatalog>,
    options: PlannerOptions,
}

impl PlanGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>, catalog: Arc<ToolCatalog>) -> Self {
        Self::with_options(llm, catalog, PlannerOptions::default())
    }

    pub fn with_options(
        llm: Arc<dyn LlmProvider>,
        catalog: Arc<ToolCatalog>,
        options: PlannerOptions,
    ) -> Self {
        Self {
            llm,
            catalog,
            options,
        }
    }

    pub fn options(&self) -> &PlannerOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: PlannerOptions) {
        self.options = options;
    }

    /// Generate a plan for `goal`. Never fails and never returns an empty plan.
    pub async fn generate(&self, goal: &str, context: Option<&TaskContext>) -> Plan {
        let prompt = build_planning_prompt(goal, context, &self.catalog);
        let request_options = LlmRequestOptions::json(self.options.temperature);
        let max_attempts = self.options.max_attempts.max(1);

        let mut messages = vec![Message::user(prompt.clone())];

        for attempt in 1..=max_attempts {
            if attempt > 1 && !self.options.retry_delay.is_zero() {
                tokio::time::sleep(self.options.retry_delay).await;
            }

            debug!(attempt, max_attempts, "requesting plan from backend");

            let response = match self
                .llm
                .send_message(messages.clone(), None, request_options.clone())
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!(attempt, error = %e, "plan generation request failed");
                    messages = vec![Message::user(prompt.clone())];
                    continue;
                }
            };

            let text = response.content.unwrap_or_default();
            debug!(
                attempt,
                len = text.len(),
                preview = %text.chars().take(300).collect::<String>(),
                "plan generation response"
            );

            match parse_plan_response(&text, &self.catalog) {
                Ok(plan) => {
                    info!(attempt, tasks = plan.len(), "plan generated");
                    return plan;
                }
                Err(reason) => {
                    warn!(attempt, reason = %reason, "plan generation response rejected");
                    messages = if text.trim().is_empty() {
                        vec![Message::user(prompt.clone())]
                    } else {
                        vec![
                            Message::user(prompt.clone()),
                            Message::assistant(text.clone()),
                            Message::user(build_repair_prompt(&text, &reason)),
                        ]
                    };
                }
            }
        }

        warn!(max_attempts, "plan generation exhausted, using fallback");
        fallback_plan(goal, &self.catalog)
    }
}
