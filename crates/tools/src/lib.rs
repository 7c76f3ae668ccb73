//! Goal Cascade Tools
//!
//! Capability providers and the registry the executor constructs them from.
//!
//! - `ProviderRegistry` - provider id -> constructor returning `Box<dyn Tool>`
//! - `TravelPlanner` - streamed day-by-day itineraries
//! - `VisionAnalyzer` - multimodal image analysis
//! - `ReadmeViewer` - local README access
//!
//! Providers that talk to a backend are built from per-task
//! `ToolCredentials` through `goal-cascade-llm`.

pub mod backend;
pub mod readme_viewer;
pub mod registry;
pub mod travel_planner;
pub mod vision_analyzer;

#[cfg(test)]
pub(crate) mod test_support;

pub use backend::{backend_from_credentials, llm_error};
pub use readme_viewer::ReadmeViewer;
pub use registry::{
    default_catalog, ProviderRegistry, ToolConstructor, README_VIEWER, TRAVEL_PLANNER,
    VISION_ANALYZER,
};
pub use travel_planner::{parse_travel_request, TravelPlanner, TravelRequest};
pub use vision_analyzer::{AnalysisMode, VisionAnalyzer};
