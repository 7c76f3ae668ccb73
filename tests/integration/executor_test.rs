//! Plan Execution Integration Tests
//!
//! Sequential execution with scripted tools: dependency threading, failure
//! isolation, fatal plans and the report wire format.

use goal_cascade::services::executor::{Executor, EMPTY_PLAN_ERROR};
use goal_cascade::{ExecutionReport, Outcome, Task, TaskContext};
use serde_json::json;

use crate::common::{catalog, scripted_registry, StaticConfig};

#[tokio::test]
async fn test_dependency_result_reaches_dependent_task() {
    let (registry, calls) = scripted_registry(&[("first", Ok("R1")), ("second", Ok("R2"))]);
    let executor = Executor::new(catalog(), registry);
    let plan = vec![
        Task::new("task_1", "first", "vision_analyzer"),
        Task::new("task_2", "second", "travel_planner").with_dependencies(["task_1"]),
    ];

    let report = executor
        .execute(&plan, &StaticConfig::default(), &TaskContext::new())
        .await;

    assert_eq!(report.outcome("task_1"), Some(&Outcome::Result("R1".into())));
    assert_eq!(report.outcome("task_2"), Some(&Outcome::Result("R2".into())));
    let calls = calls.lock().unwrap();
    assert_eq!(calls[1].1.get_str("task_1_result"), Some("R1"));
}

#[tokio::test]
async fn test_unknown_tool_then_next_task_still_runs() {
    let (registry, calls) = scripted_registry(&[]);
    let executor = Executor::new(catalog(), registry);
    let plan = vec![
        Task::new("task_1", "x", "nonexistent_tool"),
        Task::new("task_2", "y", "travel_planner").with_dependencies(["task_1"]),
    ];

    let report = executor
        .execute(&plan, &StaticConfig::default(), &TaskContext::new())
        .await;

    assert!(!report.succeeded("task_1"));
    assert!(report
        .outcome("task_1")
        .and_then(Outcome::error)
        .unwrap()
        .contains("nonexistent_tool"));
    assert!(report.succeeded("task_2"));

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(!calls[0].1.contains_key("task_1_result"));
}

#[tokio::test]
async fn test_tool_error_is_recorded_and_run_continues() {
    let (registry, _) = scripted_registry(&[("broken", Err("quota exceeded"))]);
    let executor = Executor::new(catalog(), registry);
    let plan = vec![
        Task::new("task_1", "broken", "travel_planner"),
        Task::new("task_2", "fine", "travel_planner"),
    ];

    let report = executor
        .execute(&plan, &StaticConfig::default(), &TaskContext::new())
        .await;

    let message = report.outcome("task_1").and_then(Outcome::error).unwrap();
    assert!(message.starts_with("Error executing task_1:"));
    assert!(message.contains("quota exceeded"));
    assert!(report.succeeded("task_2"));
    assert_eq!(report.summary.len(), 2);
}

#[tokio::test]
async fn test_initial_context_is_shared_but_not_mutated() {
    let (registry, calls) = scripted_registry(&[]);
    let executor = Executor::new(catalog(), registry);
    let plan = vec![
        Task::new("task_1", "a", "vision_analyzer"),
        Task::new("task_2", "b", "vision_analyzer"),
    ];
    let initial = TaskContext::new().with("image_path", "/tmp/photo.png");

    executor.execute(&plan, &StaticConfig::default(), &initial).await;

    assert_eq!(initial.len(), 1);
    let calls = calls.lock().unwrap();
    assert_eq!(calls[0].1.get_str("image_path"), Some("/tmp/photo.png"));
    assert_eq!(calls[1].1.get_str("image_path"), Some("/tmp/photo.png"));
    assert!(!calls[1].1.contains_key("task_1_result"));
}

#[tokio::test]
async fn test_empty_or_null_plan_is_fatal() {
    let (registry, calls) = scripted_registry(&[]);
    let executor = Executor::new(catalog(), registry);
    let config = StaticConfig::default();

    let report = executor.execute(&[], &config, &TaskContext::new()).await;
    assert_eq!(serde_json::to_value(&report).unwrap(), json!({"error": EMPTY_PLAN_ERROR}));

    let report = executor.execute_value(&json!(null), &config, &TaskContext::new()).await;
    assert!(report.is_fatal());
    assert!(report.tasks.is_empty());
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_untyped_plan_with_integer_dependencies() {
    let (registry, calls) = scripted_registry(&[("first", Ok("R1"))]);
    let executor = Executor::new(catalog(), registry);
    let plan = json!([
        {"task_id": "task_1", "description": "first", "tool": "travel_planner", "dependencies": 0},
        {"task_id": "task_2", "description": "second", "tool": "travel_planner", "dependencies": 1}
    ]);

    let report = executor
        .execute_value(&plan, &StaticConfig::default(), &TaskContext::new())
        .await;

    assert_eq!(report.success_count(), 2);
    assert_eq!(calls.lock().unwrap()[1].1.get_str("task_1_result"), Some("R1"));
}

#[tokio::test]
async fn test_report_json_round_trip() {
    let (registry, _) = scripted_registry(&[("ok", Ok("fine")), ("bad", Err("nope"))]);
    let executor = Executor::new(catalog(), registry);
    let plan = vec![
        Task::new("task_1", "ok", "travel_planner"),
        Task::new("task_2", "bad", "travel_planner"),
        Task::new("task_3", "?", "unknown"),
    ];

    let report = executor
        .execute(&plan, &StaticConfig::default(), &TaskContext::new())
        .await;
    let text = report.to_json_pretty().unwrap();
    let parsed: ExecutionReport = serde_json::from_str(&text).unwrap();

    assert_eq!(parsed, report);
    let ids: Vec<&str> = parsed.tasks.keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["task_1", "task_2", "task_3"]);
    assert!(parsed.tasks["task_1"].is_success());
    assert!(!parsed.tasks["task_2"].is_success());
    assert!(!parsed.tasks["task_3"].is_success());
}
