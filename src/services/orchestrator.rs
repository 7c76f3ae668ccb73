//! Orchestrator
//!
//! Entry point that ties planning and execution together: a goal goes to
//! the `PlanGenerator`, the resulting plan goes to the `Executor`, and the
//! caller gets an `ExecutionReport`. The catalog, registry, configuration
//! and planning backend are shared read-only across runs.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use goal_cascade_core::{ConfigProvider, TaskContext, ToolCatalog};
use goal_cascade_llm::LlmProvider;
use goal_cascade_tools::{backend_from_credentials, ProviderRegistry};

use crate::models::plan::{ExecutionReport, Plan, Task};
use crate::services::executor::Executor;
use crate::services::planner::{PlanGenerator, PlannerOptions};
use crate::storage::config::ConfigManager;
use crate::utils::error::{AppError, AppResult};

/// Goal → plan → report pipeline.
pub struct Orchestrator {
    catalog: Arc<ToolCatalog>,
    config: Arc<dyn ConfigProvider>,
    generator: PlanGenerator,
    executor: Executor,
}

impl Orchestrator {
    /// Assemble an orchestrator from its collaborators with default
    /// planner options and no per-task timeout.
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        catalog: Arc<ToolCatalog>,
        registry: Arc<ProviderRegistry>,
        config: Arc<dyn ConfigProvider>,
    ) -> Self {
        Self {
            generator: PlanGenerator::new(llm, catalog.clone()),
            executor: Executor::new(catalog.clone(), registry),
            catalog,
            config,
        }
    }

    /// Replace the planner options.
    pub fn with_planner_options(mut self, options: PlannerOptions) -> Self {
        self.generator.set_options(options);
        self
    }

    /// Replace the executor (e.g. to set a task timeout).
    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    /// Build everything from a loaded configuration: the tool catalog, the
    /// built-in providers and an OpenAI-compatible planning backend bound
    /// to the planner page.
    pub fn from_config(manager: ConfigManager) -> AppResult<Self> {
        let catalog = Arc::new(manager.tool_catalog()?);
        let settings = manager.config();

        let creds = manager.planner_credentials();
        let llm = backend_from_credentials(&creds)
            .map_err(|e| AppError::config(format!("planning backend: {}", e)))?;

        let options = PlannerOptions::from(&settings.planner);
        let registry = Arc::new(ProviderRegistry::with_builtin());
        let executor = Executor::new(catalog.clone(), registry.clone()).with_settings(&settings.executor);

        info!(
            tools = catalog.len(),
            planner_model = %creds.model,
            max_attempts = options.max_attempts,
            "orchestrator ready"
        );

        let config: Arc<dyn ConfigProvider> = Arc::new(manager);
        Ok(Self::new(llm, catalog, registry, config)
            .with_planner_options(options)
            .with_executor(executor))
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Plan only. Always returns a non-empty plan.
    pub async fn plan(&self, goal: &str, context: &TaskContext) -> Plan {
        self.generator.generate(goal, Some(context)).await
    }

    /// Execute a typed plan with the shared configuration.
    pub async fn execute_plan(&self, plan: &[Task], context: &TaskContext) -> ExecutionReport {
        self.executor.execute(plan, self.config.as_ref(), context).await
    }

    /// Execute an untyped plan (e.g. loaded from a file).
    pub async fn execute_plan_value(&self, plan: &Value, context: &TaskContext) -> ExecutionReport {
        self.executor
            .execute_value(plan, self.config.as_ref(), context)
            .await
    }

    /// Plan and execute a goal.
    pub async fn run_goal(&self, goal: &str, context: &TaskContext) -> ExecutionReport {
        info!(goal, "running goal");
        let plan = self.plan(goal, context).await;
        info!(tasks = plan.len(), "plan ready, executing");
        self.execute_plan(&plan, context).await
    }

    /// `run_goal` rendered as pretty JSON.
    pub async fn run_goal_json(&self, goal: &str, context: &TaskContext) -> AppResult<String> {
        let report = self.run_goal(goal, context).await;
        Ok(report.to_json_pretty()?)
    }
}
