//! Planning
//!
//! - `generator` - goal to plan through the planning backend
//! - `validator` - filters and normalizes candidate tasks
//! - `fallback` - keyword plan used when generation fails

pub mod fallback;
pub mod generator;
pub mod validator;

pub use fallback::{fallback_plan, FALLBACK_TASK_ID};
pub use generator::{
    build_planning_prompt, build_repair_prompt, extract_json_from_response, parse_plan_response,
    PlanGenerator, PlannerOptions,
};
pub use validator::{normalize_dependencies, validate_tasks, value_to_string, REQUIRED_FIELDS};
