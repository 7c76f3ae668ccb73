//! Plan Executor
//!
//! Runs a plan strictly in list order. Every task gets a fresh tool instance
//! built from the credentials of its catalog page, sees the initial context
//! plus the results of its successful dependencies, and ends with exactly
//! one outcome in the report. A failing task never stops the run.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use goal_cascade_core::{
    ConfigProvider, CoreError, CoreResult, TaskContext, ToolCatalog, ToolCredentials,
    ToolSpec, BASELINE_MODEL,
};
use goal_cascade_tools::ProviderRegistry;

use crate::models::plan::{ExecutionReport, Outcome, Task};
use crate::models::settings::ExecutorSettings;
use crate::services::planner::validator::value_to_string;

/// Top-level error for a plan that cannot be run at all.
pub const EMPTY_PLAN_ERROR: &str = "plan is empty or malformed";

const MISSING_DESCRIPTION: &str = "no description";

/// A plan entry after the structural guard.
enum Entry {
    Task(Task),
    Malformed(String),
}

/// Sequential plan executor.
#[derive(Debug, Clone)]
pub struct Executor {
    catalog: Arc<ToolCatalog>,
    registry: Arc<ProviderRegistry>,
    task_timeout: Option<Duration>,
}

impl Executor {
    pub fn new(catalog: Arc<ToolCatalog>, registry: Arc<ProviderRegistry>) -> Self {
        Self {
            catalog,
            registry,
            task_timeout: None,
        }
    }

    /// Limit each tool invocation to `timeout`. `None` or zero disables it.
    pub fn with_task_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.task_timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    /// Apply executor settings from the configuration file.
    pub fn with_settings(self, settings: &ExecutorSettings) -> Self {
        self.with_task_timeout(Some(Duration::from_secs(settings.task_timeout_secs)))
    }

    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout
    }

    /// Execute a typed plan.
    pub async fn execute(
        &self,
        plan: &[Task],
        config: &dyn ConfigProvider,
        initial_context: &TaskContext,
    ) -> ExecutionReport {
        if plan.is_empty() {
            warn!("refusing to execute an empty plan");
            return ExecutionReport::fatal(EMPTY_PLAN_ERROR);
        }

        let entries = plan.iter().cloned().map(Entry::Task).collect();
        self.run_entries(entries, config, initial_context).await
    }

    /// Execute an untyped plan, e.g. a plan file edited by hand.
    ///
    /// `null`, non-arrays and empty arrays yield a fatal report. Entries
    /// that are not objects or lack `task_id` produce a summary line and no
    /// outcome.
    pub async fn execute_value(
        &self,
        plan: &Value,
        config: &dyn ConfigProvider,
        initial_context: &TaskContext,
    ) -> ExecutionReport {
        let items = match plan.as_array() {
            Some(items) if !items.is_empty() => items,
            _ => {
                warn!("refusing to execute a null, empty or non-array plan");
                return ExecutionReport::fatal(EMPTY_PLAN_ERROR);
            }
        };

        let entries = items
            .iter()
            .enumerate()
            .map(|(index, item)| entry_from_value(index, item))
            .collect();
        self.run_entries(entries, config, initial_context).await
    }

    async fn run_entries(
        &self,
        entries: Vec<Entry>,
        config: &dyn ConfigProvider,
        initial_context: &TaskContext,
    ) -> ExecutionReport {
        let context = initial_context.clone();
        let mut report = ExecutionReport::new();
        let total = entries.len();

        for (index, entry) in entries.into_iter().enumerate() {
            let task = match entry {
                Entry::Task(task) => task,
                Entry::Malformed(message) => {
                    warn!(index, "{}", message);
                    report.push_summary(message);
                    continue;
                }
            };

            info!(
                task_id = %task.task_id,
                tool = %task.tool,
                step = index + 1,
                total,
                "executing task"
            );

            let outcome = self.run_task(&task, config, &context, &report).await;
            match &outcome {
                Outcome::Result(_) => {
                    info!(task_id = %task.task_id, "task succeeded");
                    report.push_summary(format!("{} succeeded", task.task_id));
                }
                Outcome::Error(message) => {
                    error!(task_id = %task.task_id, error = %message, "task failed");
                    report.push_summary(message.clone());
                }
            }
            report.record(task.task_id.clone(), outcome);
        }

        info!(
            succeeded = report.success_count(),
            failed = report.failure_count(),
            "plan execution finished"
        );
        report
    }

    async fn run_task(
        &self,
        task: &Task,
        config: &dyn ConfigProvider,
        context: &TaskContext,
        report: &ExecutionReport,
    ) -> Outcome {
        let Some(spec) = self.catalog.get(&task.tool) else {
            return Outcome::Error(format!(
                "Task {} uses unknown tool '{}'; available tools: [{}]",
                task.task_id,
                task.tool,
                self.catalog.names().join(", ")
            ));
        };

        let assembled = dependency_context(task, context, report);

        match self.invoke(task, spec, config, &assembled).await {
            Ok(text) => Outcome::Result(text),
            Err(e) => Outcome::Error(format!("Error executing {}: {}", task.task_id, e)),
        }
    }

    async fn invoke(
        &self,
        task: &Task,
        spec: &ToolSpec,
        config: &dyn ConfigProvider,
        context: &TaskContext,
    ) -> CoreResult<String> {
        let credentials = resolve_credentials(config, &spec.page)?;
        if !self.registry.contains(&spec.provider) {
            return Err(CoreError::not_found(format!(
                "tool '{}' is bound to unregistered provider '{}'; registered providers: [{}]",
                spec.name,
                spec.provider,
                self.registry.providers().join(", ")
            )));
        }
        debug!(
            task_id = %task.task_id,
            provider = %spec.provider,
            page = %spec.page,
            base_url = %credentials.base_url,
            model = %credentials.model,
            "constructing tool"
        );

        let tool = self.registry.construct(&spec.provider, credentials)?;
        let call = AssertUnwindSafe(tool.execute(&task.description, context)).catch_unwind();

        let finished = match self.task_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                CoreError::tool(format!("timed out after {}s", limit.as_secs_f64()))
            })?,
            None => call.await,
        };

        finished.map_err(|payload| {
            CoreError::internal(format!("tool panicked: {}", panic_message(payload.as_ref())))
        })?
    }
}

/// Credentials for a page. The model falls back to the baseline when the
/// page is absent or does not name one.
fn resolve_credentials(config: &dyn ConfigProvider, page: &str) -> CoreResult<ToolCredentials> {
    let api_key = config.api_key(page)?;
    let base_url = config.base_url(page)?;
    let model = match config.page_config(page) {
        Ok(page_config) => page_config.model_or_baseline(),
        Err(e) => {
            debug!(page, error = %e, "page config unavailable, using baseline model");
            BASELINE_MODEL.to_string()
        }
    };
    Ok(ToolCredentials::new(api_key, base_url, model)
        .with_request_timeout(config.request_timeout_secs()))
}

/// Copy of `context` plus `"<dep>_result"` for every dependency that has
/// already succeeded. Other dependencies are skipped.
fn dependency_context(task: &Task, context: &TaskContext, report: &ExecutionReport) -> TaskContext {
    let mut assembled = context.clone();
    for dep in &task.dependencies {
        match report.outcome(dep).and_then(Outcome::result) {
            Some(result) => assembled.insert_result(dep, result),
            None => debug!(task_id = %task.task_id, dependency = %dep, "dependency has no result, skipping"),
        }
    }
    assembled
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Apply the structural guard and field defaults to one untyped entry.
fn entry_from_value(index: usize, item: &Value) -> Entry {
    let Some(object) = item.as_object() else {
        return Entry::Malformed(format!("Task {} is malformed: {}", index, item));
    };
    let Some(task_id) = object.get("task_id") else {
        return Entry::Malformed(format!("Task {} is missing task_id: {}", index, item));
    };

    Entry::Task(Task {
        task_id: value_to_string(task_id),
        description: object
            .get("description")
            .map(value_to_string)
            .unwrap_or_else(|| MISSING_DESCRIPTION.to_string()),
        tool: object.get("tool").map(value_to_string).unwrap_or_default(),
        dependencies: object
            .get("dependencies")
            .map(untyped_dependencies)
            .unwrap_or_default(),
    })
}

/// Dependencies of an untyped entry. Bare numbers name `task_<n>`.
///
/// - `0`, `"0"` and `""` mean none
/// - an integer or numeric string `n` becomes `["task_n"]`
/// - any other string is taken as a task id
/// - array elements follow the same rules
/// - anything else means none
pub fn untyped_dependencies(value: &Value) -> Vec<String> {
    fn one(value: &Value) -> Option<String> {
        match value {
            Value::Number(n) => match n.as_u64() {
                Some(0) | None => None,
                Some(n) => Some(format!("task_{}", n)),
            },
            Value::String(s) if s.is_empty() || s == "0" => None,
            Value::String(s) => match s.parse::<u64>() {
                Ok(n) => Some(format!("task_{}", n)),
                Err(_) => Some(s.clone()),
            },
            _ => None,
        }
    }

    match value {
        Value::Array(items) => items.iter().filter_map(one).collect(),
        scalar => one(scalar).into_iter().collect(),
    }
}
