//! Services
//!
//! Planning, execution and the orchestrator that chains them.

pub mod executor;
pub mod orchestrator;
pub mod planner;

pub use executor::{untyped_dependencies, Executor, EMPTY_PLAN_ERROR};
pub use orchestrator::Orchestrator;
pub use planner::{fallback_plan, validate_tasks, PlanGenerator, PlannerOptions};
