//! Goal Cascade Core
//!
//! Foundational traits, error types, task context and tool catalog for the
//! Goal Cascade workspace. This crate has zero dependencies on
//! application-level code (configuration files, LLM providers, etc.).
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `context` - Per-task context mapping (`TaskContext`)
//! - `config` - Configuration collaborator trait (`ConfigProvider`, `PageConfig`)
//! - `tool_trait` - Tool interface and catalog (`Tool`, `ToolSpec`, `ToolCatalog`)

pub mod config;
pub mod context;
pub mod error;
pub mod tool_trait;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Context ────────────────────────────────────────────────────────────
pub use context::{result_key, TaskContext};

// ── Configuration Collaborator ─────────────────────────────────────────
pub use config::{ConfigProvider, PageConfig, BASELINE_MODEL};

// ── Tools ──────────────────────────────────────────────────────────────
pub use tool_trait::{Tool, ToolCatalog, ToolCredentials, ToolSpec};
