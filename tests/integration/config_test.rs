//! Configuration Integration Tests
//!
//! Loading the shipped configuration file and resolving per-page
//! credentials through the `ConfigProvider` interface.

use std::io::Write;

use goal_cascade::{ConfigManager, ConfigProvider, DEFAULT_CONFIG_PATH};
use goal_cascade_core::BASELINE_MODEL;

#[test]
fn test_shipped_config_parses() {
    let manager = ConfigManager::load(DEFAULT_CONFIG_PATH)
        .unwrap()
        .with_env_lookup(|_| None);

    let catalog = manager.tool_catalog().unwrap();
    assert_eq!(
        catalog.names(),
        vec!["travel_planner", "vision_analyzer", "readme_viewer"]
    );
    assert_eq!(catalog.get("vision_analyzer").unwrap().page, "image_recognition");
    assert_eq!(manager.config().planner.max_attempts, 3);
    assert_eq!(manager.config().executor.task_timeout_secs, 300);
    assert_eq!(
        manager.page_config("image_recognition").unwrap().model_or_baseline(),
        "qwen-vl-plus"
    );
    assert_eq!(
        manager.page_config("readme").unwrap().model_or_baseline(),
        BASELINE_MODEL
    );
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let manager = ConfigManager::load(dir.path().join("absent.toml"))
        .unwrap()
        .with_env_lookup(|_| None);

    assert_eq!(manager.tool_catalog().unwrap().len(), 3);
    assert!(manager.page_config("travel_agent").is_err());
    assert_eq!(manager.api_key("travel_agent").unwrap(), "");
}

#[test]
fn test_env_overrides_file_and_can_be_disabled() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[api]
default_api_key = "sk-file"
default_base_url = "https://file.example/v1"
"#
    )
    .unwrap();

    let manager = ConfigManager::load(file.path()).unwrap().with_env_lookup(|name| {
        (name == "OPENAI_API_KEY").then(|| "sk-env".to_string())
    });
    assert_eq!(manager.api_key("travel_agent").unwrap(), "sk-env");
    assert_eq!(manager.base_url("travel_agent").unwrap(), "https://file.example/v1");

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[api]
use_environment_variables = false
default_api_key = "sk-file"
"#
    )
    .unwrap();
    let manager = ConfigManager::load(file.path())
        .unwrap()
        .with_env_lookup(|_| Some("sk-env".to_string()));
    assert_eq!(manager.api_key("travel_agent").unwrap(), "sk-file");
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "[planner]\nmax_attempts = 0\n").unwrap();
    assert!(ConfigManager::load(file.path()).is_err());

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "[tools.broken]\ndescription = 1\n").unwrap();
    let manager = ConfigManager::load(file.path()).unwrap();
    assert!(manager.tool_catalog().is_err());
}
