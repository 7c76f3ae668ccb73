//! Integration Tests Module
//!
//! End-to-end coverage for Goal Cascade: plan generation against a scripted
//! backend, plan execution with mock and built-in tools, configuration
//! loading, and the full goal-to-report pipeline.

// Shared scripted backend, mock tools and config doubles
mod common;

// Plan generation, repair and fallback
mod planner_test;

// Sequential execution, dependency threading and failure isolation
mod executor_test;

// TOML configuration and credential resolution
mod config_test;

// Goal -> plan -> report pipeline
mod orchestrator_test;
