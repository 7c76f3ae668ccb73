//! Plan and Report Models
//!
//! A `Plan` is an ordered list of `Task`s. Executing it produces an
//! `ExecutionReport` with one `Outcome` per attempted task.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// One step of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique within a plan (e.g. "task_1")
    pub task_id: String,
    /// Free-text instruction handed to the tool
    pub description: String,
    /// Logical tool name from the catalog
    pub tool: String,
    /// Task ids whose results should be visible to this task
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl Task {
    pub fn new(
        task_id: impl Into<String>,
        description: impl Into<String>,
        tool: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            description: description.into(),
            tool: tool.into(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }
}

/// Ordered list of tasks; order is execution order.
pub type Plan = Vec<Task>;

/// Result of one attempted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Tool output text
    Result(String),
    /// Human-readable failure
    Error(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Result(_))
    }

    /// Output text of a successful outcome
    pub fn result(&self) -> Option<&str> {
        match self {
            Outcome::Result(text) => Some(text),
            Outcome::Error(_) => None,
        }
    }

    /// Message of a failed outcome
    pub fn error(&self) -> Option<&str> {
        match self {
            Outcome::Result(_) => None,
            Outcome::Error(msg) => Some(msg),
        }
    }
}

/// Aggregate result of one execution run.
///
/// Serializes as `{"summary": [...], "tasks": {...}}`, or as
/// `{"error": "..."}` when the plan could not be run at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExecutionReport {
    /// Fatal plan-level error; no tasks were attempted when set
    #[serde(default)]
    pub error: Option<String>,
    /// Human-readable lines in execution order
    #[serde(default)]
    pub summary: Vec<String>,
    /// Outcome per attempted task id
    #[serde(default)]
    pub tasks: BTreeMap<String, Outcome>,
}

impl ExecutionReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report for a plan that could not be run.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.error.is_some()
    }

    pub fn record(&mut self, task_id: impl Into<String>, outcome: Outcome) {
        self.tasks.insert(task_id.into(), outcome);
    }

    pub fn push_summary(&mut self, line: impl Into<String>) {
        self.summary.push(line.into());
    }

    pub fn outcome(&self, task_id: &str) -> Option<&Outcome> {
        self.tasks.get(task_id)
    }

    /// Whether `task_id` has a recorded successful outcome
    pub fn succeeded(&self, task_id: &str) -> bool {
        self.outcome(task_id).is_some_and(Outcome::is_success)
    }

    pub fn success_count(&self) -> usize {
        self.tasks.values().filter(|o| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.tasks.len() - self.success_count()
    }

    /// Pretty JSON rendering
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for ExecutionReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.error {
            Some(error) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", error)?;
                map.end()
            }
            None => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("summary", &self.summary)?;
                map.serialize_entry("tasks", &self.tasks)?;
                map.end()
            }
        }
    }
}
