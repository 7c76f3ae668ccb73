//! Orchestrator Integration Tests
//!
//! Goal to report with a scripted planning backend, using both mock tools
//! and the built-in README viewer.

use std::io::Write;
use std::sync::Arc;

use goal_cascade::{ConfigManager, Orchestrator, TaskContext};
use goal_cascade_tools::{default_catalog, ProviderRegistry};
use serde_json::Value;

use crate::common::{catalog, scripted_registry, MockLlmProvider, StaticConfig};

#[tokio::test]
async fn test_run_goal_end_to_end() {
    let plan = r#"{"plan": [
        {"task_id": "task_1", "description": "看图", "tool": "vision_analyzer", "dependencies": []},
        {"task_id": "task_2", "description": "规划", "tool": "travel_planner", "dependencies": ["task_1"]}
    ]}"#;
    let llm = MockLlmProvider::with_texts(&[plan]);
    let (registry, calls) = scripted_registry(&[("看图", Ok("一张西湖的照片")), ("规划", Ok("Day 1: 西湖"))]);
    let orchestrator = Orchestrator::new(llm, catalog(), registry, Arc::new(StaticConfig::default()));

    let context = TaskContext::new().with("image_path", "/tmp/westlake.jpg");
    let json = orchestrator.run_goal_json("看看这张图然后规划杭州旅行", &context).await.unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["tasks"]["task_1"]["result"], "一张西湖的照片");
    assert_eq!(value["tasks"]["task_2"]["result"], "Day 1: 西湖");
    assert_eq!(value["summary"].as_array().unwrap().len(), 2);

    let calls = calls.lock().unwrap();
    assert_eq!(calls[1].1.get_str("task_1_result"), Some("一张西湖的照片"));
    assert_eq!(calls[1].1.get_str("image_path"), Some("/tmp/westlake.jpg"));
}

#[tokio::test]
async fn test_garbage_backend_still_produces_report() {
    let llm = MockLlmProvider::with_texts(&["nope", "still nope", "{"]);
    let (registry, _) = scripted_registry(&[]);
    let orchestrator = Orchestrator::new(llm.clone(), catalog(), registry, Arc::new(StaticConfig::default()));

    let report = orchestrator.run_goal("分析这张图片", &TaskContext::new()).await;

    assert_eq!(llm.call_count(), 3);
    assert!(!report.is_fatal());
    assert_eq!(report.tasks.len(), 1);
    assert!(report.succeeded("task_1"));
}

#[tokio::test]
async fn test_plan_then_execute_with_builtin_readme_viewer() {
    let mut readme = tempfile::NamedTempFile::new().unwrap();
    write!(readme, "# Goal Cascade\n\nPlans goals.\n").unwrap();

    let plan = r#"{"plan": [
        {"task_id": "task_1", "description": "显示README", "tool": "readme_viewer", "dependencies": []},
        {"task_id": "task_2", "description": "summarize the project", "tool": "readme_viewer", "dependencies": ["task_1"]}
    ]}"#;
    let llm = MockLlmProvider::with_texts(&[plan]);
    let config = ConfigManager::default().with_env_lookup(|_| None);
    let orchestrator = Orchestrator::new(
        llm,
        Arc::new(default_catalog()),
        Arc::new(ProviderRegistry::with_builtin()),
        Arc::new(config),
    );

    let context = TaskContext::new().with("readme_path", readme.path().to_string_lossy().to_string());
    let plan = orchestrator.plan("显示README", &context).await;
    assert_eq!(plan.len(), 2);

    let report = orchestrator.execute_plan(&plan, &context).await;
    assert!(report
        .outcome("task_1")
        .and_then(|o| o.result())
        .unwrap()
        .contains("Plans goals."));
    assert_eq!(
        report.outcome("task_2").and_then(|o| o.result()),
        Some("Handled README request 'summarize the project' (document: Goal Cascade)")
    );
}
