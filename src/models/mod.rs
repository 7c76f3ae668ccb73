//! Data Models
//!
//! Plans, reports and configuration structures.

pub mod plan;
pub mod settings;

pub use plan::*;
pub use settings::*;
