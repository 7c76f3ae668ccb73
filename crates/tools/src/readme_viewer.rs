//! README Viewer
//!
//! Local provider that needs no backend: shows the project README or
//! acknowledges README-related requests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use goal_cascade_core::{CoreResult, TaskContext, Tool};

use crate::registry::README_VIEWER;

/// Context key overriding the README location.
pub const README_PATH_KEY: &str = "readme_path";

const DEFAULT_README: &str = "README.md";
const VIEW_KEYWORDS: [&str; 5] = ["显示", "查看", "readme", "show", "view"];

/// First Markdown heading of `content`, without the leading `#`s.
pub fn first_heading(content: &str) -> Option<&str> {
    content
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with('#'))
        .map(|line| line.trim_start_matches('#').trim())
        .filter(|heading| !heading.is_empty())
}

fn is_view_request(description: &str) -> bool {
    let lower = description.to_lowercase();
    VIEW_KEYWORDS.iter().any(|k| lower.contains(k))
}

#[derive(Debug, Clone)]
pub struct ReadmeViewer {
    default_path: PathBuf,
}

impl Default for ReadmeViewer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadmeViewer {
    pub fn new() -> Self {
        Self::with_path(DEFAULT_README)
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            default_path: path.into(),
        }
    }

    fn resolve_path<'a>(&'a self, context: &'a TaskContext) -> &'a Path {
        context
            .get_str(README_PATH_KEY)
            .filter(|p| !p.trim().is_empty())
            .map(Path::new)
            .unwrap_or(self.default_path.as_path())
    }
}

#[async_trait]
impl Tool for ReadmeViewer {
    fn name(&self) -> &str {
        README_VIEWER
    }

    async fn execute(&self, description: &str, context: &TaskContext) -> CoreResult<String> {
        let path = self.resolve_path(context);
        let content = tokio::fs::read_to_string(path).await?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "readme loaded");

        if is_view_request(description) {
            return Ok(content);
        }

        let title = first_heading(&content).unwrap_or("README");
        Ok(format!("Handled README request '{}' (document: {})", description, title))
    }
}
