//! Integration tests for configuration management
//!
//! These tests verify that the Config struct can be properly loaded,
//! validated, and processed with path expansion and store path resolution.

use matchday_engine::config::Config;

fn config_toml(data_dir: &std::path::Path, extra: &str) -> String {
    format!(
        r#"
[core]
log_level = "info"
data_dir = "{}"

[llm]
default_provider = "openai"

{}
"#,
        data_dir.display(),
        extra
    )
}

#[test]
fn test_minimal_config_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::from_toml_str(&config_toml(dir.path(), "")).unwrap();

    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8000);
    assert!(config.server.cors_allow_any);
    assert_eq!(config.memory.max_history_chars, 10_000);
    assert_eq!(config.llm.request_timeout_secs, 30);
    assert_eq!(config.llm.openai.model, "gpt-4o-mini");
    assert_eq!(config.llm.ollama.model, "llama3.1:8b");

    // Store paths resolve under the data directory and are created
    assert_eq!(config.preorder.orders_file, dir.path().join("orders.json"));
    assert_eq!(config.preorder.dataset_dir, dir.path().join("datasets"));
    assert_eq!(config.report.reports_dir, dir.path().join("reports"));
    assert!(config.preorder.dataset_dir.is_dir());
    assert!(config.report.reports_dir.is_dir());
}

#[test]
fn test_full_config() {
    let dir = tempfile::tempdir().unwrap();
    let extra = r#"
[server]
host = "0.0.0.0"
port = 9000
cors_allow_any = false

[memory]
max_history_chars = 2000

[preorder]
dataset_dir = "data/sets"
orders_file = "/tmp/matchday-orders.json"

[report]
reports_dir = "incoming"
"#;
    let config = Config::from_toml_str(&config_toml(dir.path(), extra)).unwrap();

    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9000);
    assert!(!config.server.cors_allow_any);
    assert_eq!(config.memory.max_history_chars, 2000);
    assert_eq!(config.preorder.dataset_dir, dir.path().join("data/sets"));
    assert_eq!(
        config.preorder.orders_file,
        std::path::PathBuf::from("/tmp/matchday-orders.json")
    );
    assert_eq!(config.report.reports_dir, dir.path().join("incoming"));
}

#[test]
fn test_invalid_log_level_detection() {
    let dir = tempfile::tempdir().unwrap();
    let toml = config_toml(dir.path(), "").replace("\"info\"", "\"verbose\"");

    let err = Config::from_toml_str(&toml).unwrap_err();
    assert!(err.to_string().contains("verbose"));
}

#[test]
fn test_invalid_provider_detection() {
    let dir = tempfile::tempdir().unwrap();
    let toml = config_toml(dir.path(), "").replace("\"openai\"", "\"gemini\"");

    assert!(Config::from_toml_str(&toml).is_err());
}

#[test]
fn test_zero_timeout_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let toml = config_toml(dir.path(), "").replace(
        "default_provider = \"openai\"",
        "default_provider = \"openai\"\nlocal_timeout_secs = 0",
    );

    assert!(Config::from_toml_str(&toml).is_err());
}

#[test]
fn test_load_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, config_toml(dir.path(), "")).unwrap();

    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.llm.default_provider, "openai");

    assert!(Config::load_from_path(&dir.path().join("missing.toml")).is_err());
}
