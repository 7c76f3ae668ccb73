//! Fallback Planning
//!
//! Keyword-based single-task plan used when the planning backend fails.
//! Pure and infallible; never calls the backend.

use goal_cascade_core::ToolCatalog;
use goal_cascade_tools::{TRAVEL_PLANNER, VISION_ANALYZER};

use crate::models::plan::{Plan, Task};

const TRAVEL_KEYWORDS: [&str; 5] = ["旅行", "旅游", "行程", "travel", "trip"];
const IMAGE_KEYWORDS: [&str; 6] = ["图片", "图像", "分析", "识别", "image", "photo"];

/// Task id of the single fallback task.
pub const FALLBACK_TASK_ID: &str = "task_1";

/// Build a one-task plan from keywords in `goal`.
///
/// Travel keywords win over image keywords; anything else goes to the
/// travel planner. Tools are looked up in `catalog` by provider, so a
/// renamed catalog entry is still chosen under its configured name.
pub fn fallback_plan(goal: &str, catalog: &ToolCatalog) -> Plan {
    let lower = goal.to_lowercase();
    let mentions = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

    let (provider, description) = if mentions(&TRAVEL_KEYWORDS[..]) {
        (TRAVEL_PLANNER, format!("Create a travel plan for the user's goal: {}", goal))
    } else if mentions(&IMAGE_KEYWORDS[..]) {
        (VISION_ANALYZER, format!("Analyze the user's uploaded image: {}", goal))
    } else {
        (TRAVEL_PLANNER, format!("Handle the user's request: {}", goal))
    };

    let tool = tool_for_provider(catalog, provider);
    tracing::info!(tool = %tool, provider, "using fallback plan");
    vec![Task::new(FALLBACK_TASK_ID, description, tool)]
}

/// First catalog tool bound to `provider` (or named after it), then the
/// travel planner's tool, then the first tool in the catalog. An empty
/// catalog yields the provider id itself.
fn tool_for_provider(catalog: &ToolCatalog, provider: &str) -> String {
    let bound_to = |id: &str| {
        catalog
            .iter()
            .find(|spec| spec.provider == id)
            .or_else(|| catalog.get(id))
    };
    bound_to(provider)
        .or_else(|| bound_to(TRAVEL_PLANNER))
        .or_else(|| catalog.iter().next())
        .map(|spec| spec.name.clone())
        .unwrap_or_else(|| provider.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use goal_cascade_core::ToolSpec;
    use goal_cascade_tools::default_catalog;

    fn only_task(goal: &str) -> Task {
        let plan = fallback_plan(goal, &default_catalog());
        assert_eq!(plan.len(), 1);
        plan.into_iter().next().unwrap()
    }

    #[test]
    fn test_travel_goal() {
        let task = only_task("帮我规划一次旅行");
        assert_eq!(task.task_id, "task_1");
        assert_eq!(task.tool, "travel_planner");
        assert!(task.dependencies.is_empty());
        assert!(task.description.contains("帮我规划一次旅行"));
    }

    #[test]
    fn test_image_goal() {
        assert_eq!(only_task("分析这张图片").tool, "vision_analyzer");
        assert_eq!(only_task("Describe this PHOTO").tool, "vision_analyzer");
    }

    #[test]
    fn test_travel_wins_over_image() {
        assert_eq!(only_task("分析这次旅行的照片").tool, "travel_planner");
    }

    #[test]
    fn test_default_goal() {
        let task = only_task("hello");
        assert_eq!(task.tool, "travel_planner");
        assert!(task.description.contains("hello"));
    }

    #[test]
    fn test_english_trip_keyword_is_case_insensitive() {
        assert_eq!(only_task("Plan a TRIP to Rome").tool, "travel_planner");
    }

    #[test]
    fn test_renamed_tools_are_found_by_provider() {
        let catalog = ToolCatalog::from_specs(vec![
            ToolSpec::new("look", "Looks at images", VISION_ANALYZER, "image_recognition"),
            ToolSpec::new("itinerary", "Plans trips", TRAVEL_PLANNER, "travel_agent"),
        ]);
        assert_eq!(fallback_plan("帮我规划一次旅行", &catalog)[0].tool, "itinerary");
        assert_eq!(fallback_plan("分析这张图片", &catalog)[0].tool, "look");
        assert_eq!(fallback_plan("hello", &catalog)[0].tool, "itinerary");
    }

    #[test]
    fn test_missing_provider_uses_catalog_tool() {
        let catalog = ToolCatalog::from_specs(vec![ToolSpec::new(
            "itinerary",
            "Plans trips",
            TRAVEL_PLANNER,
            "travel_agent",
        )]);
        assert_eq!(fallback_plan("分析这张图片", &catalog)[0].tool, "itinerary");

        let only_readme = ToolCatalog::from_specs(vec![ToolSpec::new(
            "docs",
            "Shows the README",
            "readme_viewer",
            "readme",
        )]);
        assert_eq!(fallback_plan("hello", &only_readme)[0].tool, "docs");

        assert_eq!(fallback_plan("hello", &ToolCatalog::new())[0].tool, "travel_planner");
    }

    #[test]
    fn test_tool_named_after_provider_is_used() {
        let catalog = ToolCatalog::from_specs(vec![
            ToolSpec::new("travel_planner", "Plans trips", "scripted", "travel_agent"),
            ToolSpec::new("vision_analyzer", "Analyzes images", "scripted", "image_recognition"),
        ]);
        assert_eq!(fallback_plan("分析这张图片", &catalog)[0].tool, "vision_analyzer");
    }
}
