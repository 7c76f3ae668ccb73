//! Goal Cascade
//!
//! Turns a free-form goal into a multi-step plan over a fixed tool catalog
//! and executes it in order, threading each task's result into the tasks
//! that depend on it. It includes:
//! - Plan generation with repair retries and a keyword fallback
//! - A sequential executor that records one outcome per task
//! - TOML configuration with environment overrides
//! - Data models for plans and reports

pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use models::plan::{ExecutionReport, Outcome, Plan, Task};
pub use models::settings::AppConfig;
pub use services::executor::Executor;
pub use services::orchestrator::Orchestrator;
pub use services::planner::{PlanGenerator, PlannerOptions};
pub use storage::config::{ConfigManager, DEFAULT_CONFIG_PATH};
pub use utils::error::{AppError, AppResult};

pub use goal_cascade_core::{ConfigProvider, TaskContext, ToolCatalog, ToolSpec};
