//! Storage Layer
//!
//! TOML configuration loading and credential resolution.

pub mod config;

pub use config::*;
