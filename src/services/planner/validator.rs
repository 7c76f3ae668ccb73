//! Plan Validation
//!
//! Filters and normalizes candidate task objects produced by the planning
//! backend. Never fails: invalid candidates are dropped.

use serde_json::Value;
use tracing::debug;

use goal_cascade_core::ToolCatalog;

use crate::models::plan::{Plan, Task};

/// Keys every candidate task must carry.
pub const REQUIRED_FIELDS: [&str; 4] = ["task_id", "description", "tool", "dependencies"];

/// String form of a JSON value: strings verbatim, everything else as
/// compact JSON text.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_empty_marker(value: &Value) -> bool {
    match value {
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        _ => false,
    }
}

/// Normalize a `dependencies` value into a list of task ids.
///
/// - `0`, `"0"`, `""` and `false` mean "no dependencies"
/// - any other scalar becomes a one-element list
/// - `null` and objects become an empty list
/// - arrays keep every element, converted to strings
pub fn normalize_dependencies(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(value_to_string).collect(),
        Value::Null | Value::Object(_) => Vec::new(),
        scalar if is_empty_marker(scalar) => Vec::new(),
        scalar => vec![value_to_string(scalar)],
    }
}

/// Validate one candidate. `None` means the candidate is dropped.
fn validate_task(index: usize, candidate: &Value, catalog: &ToolCatalog) -> Option<Task> {
    let Some(object) = candidate.as_object() else {
        debug!(index, "dropping non-object plan entry");
        return None;
    };

    if let Some(missing) = REQUIRED_FIELDS.iter().find(|f| !object.contains_key(**f)) {
        debug!(index, field = *missing, "dropping plan entry with missing field");
        return None;
    }

    let task = Task {
        task_id: value_to_string(&object["task_id"]),
        description: value_to_string(&object["description"]),
        tool: value_to_string(&object["tool"]),
        dependencies: normalize_dependencies(&object["dependencies"]),
    };

    if !catalog.contains(&task.tool) {
        debug!(index, tool = %task.tool, "dropping plan entry with unknown tool");
        return None;
    }

    Some(task)
}

/// Validate candidate task objects against the catalog, keeping input order.
pub fn validate_tasks(candidates: &[Value], catalog: &ToolCatalog) -> Plan {
    let plan: Plan = candidates
        .iter()
        .enumerate()
        .filter_map(|(index, candidate)| validate_task(index, candidate, catalog))
        .collect();

    debug!(
        candidates = candidates.len(),
        accepted = plan.len(),
        "plan validation finished"
    );
    plan
}
