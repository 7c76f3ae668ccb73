//! Plan Generation Integration Tests
//!
//! The generator against a scripted backend: first-try success, repair
//! retries, and the keyword fallback after exhaustion.

use std::sync::Arc;

use goal_cascade::services::planner::{fallback_plan, validate_tasks, PlanGenerator, PlannerOptions};
use goal_cascade_core::{ToolCatalog, ToolSpec};
use goal_cascade_llm::LlmError;
use serde_json::json;

use crate::common::{catalog, MockLlmProvider};

// ============================================================================
// Generation
// ============================================================================

#[tokio::test]
async fn test_fenced_plan_is_accepted() {
    let response = "```json\n{\"plan\": [{\"task_id\": \"task_1\", \"description\": \"为合肥的2日游制定详细行程\", \"tool\": \"travel_planner\", \"dependencies\": []}]}\n```";
    let llm = MockLlmProvider::with_texts(&[response]);
    let generator = PlanGenerator::new(llm.clone(), catalog());

    let plan = generator.generate("合肥两日游", None).await;

    assert_eq!(llm.call_count(), 1);
    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].description, "为合肥的2日游制定详细行程");
}

#[tokio::test]
async fn test_invalid_tasks_are_filtered_not_fatal() {
    let response = r#"{"plan": [
        {"task_id": "task_1", "description": "x", "tool": "nonexistent_tool", "dependencies": []},
        {"task_id": "task_2", "description": "y", "tool": "vision_analyzer"},
        {"task_id": "task_3", "description": "z", "tool": "travel_planner", "dependencies": "0"}
    ]}"#;
    let llm = MockLlmProvider::with_texts(&[response]);
    let generator = PlanGenerator::new(llm, catalog());

    let plan = generator.generate("goal", None).await;

    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].task_id, "task_3");
    assert!(plan[0].dependencies.is_empty());
}

#[tokio::test]
async fn test_malformed_outputs_fall_back_to_non_empty_plan() {
    let malformed = [
        "",
        "I cannot help with that",
        "[]",
        r#"{"tasks": []}"#,
        r#"{"plan": {}}"#,
        r#"{"plan": []}"#,
        r#"{"plan": [{"task_id": "t", "description": "d", "tool": "hammer", "dependencies": []}]}"#,
    ];

    for text in malformed {
        let llm = MockLlmProvider::with_texts(&[text, text, text]);
        let generator = PlanGenerator::new(llm.clone(), catalog());
        let plan = generator.generate("帮我规划一次旅行", None).await;

        assert_eq!(plan.len(), 1, "fallback expected for {:?}", text);
        assert_eq!(plan[0].task_id, "task_1");
        assert_eq!(plan[0].tool, "travel_planner");
        assert_eq!(llm.call_count(), 3);
    }
}

#[tokio::test]
async fn test_repair_attempt_carries_bad_response() {
    let good = r#"{"plan": [{"task_id": "task_1", "description": "d", "tool": "vision_analyzer", "dependencies": []}]}"#;
    let llm = MockLlmProvider::with_texts(&[r#"{"plan": "nope"}"#, good]);
    let generator = PlanGenerator::new(llm.clone(), catalog());

    let plan = generator.generate("分析这张图片", None).await;
    assert_eq!(plan[0].tool, "vision_analyzer");

    let calls = llm.calls();
    assert_eq!(calls[0].len(), 1);
    assert_eq!(calls[1].len(), 3);
    assert_eq!(calls[1][1].text_content(), r#"{"plan": "nope"}"#);
    assert!(calls[1][2].text_content().contains("not an array"));
}

#[tokio::test]
async fn test_backend_unavailable_uses_fallback() {
    let llm = MockLlmProvider::new(vec![Err(LlmError::AuthenticationFailed {
        message: "bad key".to_string(),
    })]);
    let generator = PlanGenerator::with_options(
        llm.clone(),
        catalog(),
        PlannerOptions {
            max_attempts: 1,
            ..Default::default()
        },
    );

    let plan = generator.generate("分析这张图片", None).await;
    assert_eq!(llm.call_count(), 1);
    assert_eq!(plan[0].tool, "vision_analyzer");
}

// ============================================================================
// Fallback and validation
// ============================================================================

#[test]
fn test_fallback_keyword_selection() {
    let catalog = catalog();
    assert_eq!(fallback_plan("帮我规划一次旅行", &catalog)[0].tool, "travel_planner");
    assert_eq!(fallback_plan("分析这张图片", &catalog)[0].tool, "vision_analyzer");
    assert_eq!(fallback_plan("hello", &catalog)[0].tool, "travel_planner");
}

#[tokio::test]
async fn test_fallback_uses_configured_tool_names() {
    let renamed = Arc::new(ToolCatalog::from_specs(vec![
        ToolSpec::new("itinerary", "Plans trips", "travel_planner", "travel_agent"),
        ToolSpec::new("look", "Analyzes images", "vision_analyzer", "image_recognition"),
    ]));
    let llm = MockLlmProvider::with_texts(&["not json", "still not json", "nope"]);
    let generator = PlanGenerator::new(llm, renamed.clone());

    let plan = generator.generate("分析这张图片", None).await;
    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].tool, "look");
    assert!(renamed.contains(&plan[0].tool));
}

#[test]
fn test_validation_is_idempotent_on_validated_plans() {
    let candidates = vec![
        json!({"task_id": "task_1", "description": "a", "tool": "travel_planner", "dependencies": 0}),
        json!({"task_id": "task_2", "description": "b", "tool": "vision_analyzer", "dependencies": "task_1"}),
    ];
    let once = validate_tasks(&candidates, &catalog());
    let as_values: Vec<_> = once.iter().map(|t| serde_json::to_value(t).unwrap()).collect();
    let twice = validate_tasks(&as_values, &catalog());
    assert_eq!(once, twice);
    assert_eq!(twice[1].dependencies, vec!["task_1"]);
}
