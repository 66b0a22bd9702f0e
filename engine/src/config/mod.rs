//! Configuration management
//!
//! This module handles loading, validation, and management of the Matchday
//! configuration. Configuration is stored in TOML format at
//! ~/.matchday/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level, data directory
//! - **server**: HTTP bind address and CORS policy
//! - **llm**: Provider settings and call timeouts
//! - **memory**: Conversation memory budget
//! - **preorder**: Dataset directory and order file for the preorder chatbot
//! - **report**: Output directory for emergency reports
//!
//! # Path Expansion
//!
//! `~` is expanded to the user's home directory and relative store paths are
//! resolved against `core.data_dir`. Directories are created on load.
//!
//! # Examples
//!
//! ```no_run
//! use matchday_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! println!("Listening on {}:{}", config.server.host, config.server.port);
//! println!("Default provider: {}", config.llm.default_provider);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Providers the engine knows how to construct
pub const VALID_PROVIDERS: [&str; 2] = ["openai", "ollama"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    pub core: CoreConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// LLM provider configuration
    pub llm: LLMConfig,

    /// Conversation memory configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Preorder chatbot storage
    #[serde(default)]
    pub preorder: PreorderConfig,

    /// Emergency report storage
    #[serde(default)]
    pub report: ReportConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Data directory path (supports ~ expansion)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allow any origin (the mobile client is served from arbitrary hosts)
    #[serde(default = "default_true")]
    pub cors_allow_any: bool,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Provider tried first (openai, ollama)
    pub default_provider: String,

    /// Timeout for a single cloud provider call, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Timeout for a single local provider call, in seconds
    #[serde(default = "default_local_timeout")]
    pub local_timeout_secs: u64,

    /// OpenAI provider settings
    #[serde(default)]
    pub openai: OpenAIConfig,

    /// Ollama provider settings
    #[serde(default)]
    pub ollama: OllamaConfig,
}

/// OpenAI provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// Base URL for OpenAI API
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Chat model name
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Model used for image captioning
    #[serde(default = "default_openai_vision_model")]
    pub vision_model: String,

    /// Completion length cap
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    // Note: API key comes from OPENAI_API_KEY or the OS keychain, not config
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL for Ollama API
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// Vision-capable model used for captioning
    #[serde(default = "default_ollama_vision_model")]
    pub vision_model: String,
}

/// Conversation memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Budget for the serialized size of retained turns, in bytes
    #[serde(default = "default_max_history_chars")]
    pub max_history_chars: usize,

    /// Sessions idle for longer than this are dropped, in seconds
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,

    /// Upper bound on sessions held in memory; the least recently used
    /// session is dropped to make room
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

/// Preorder chatbot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreorderConfig {
    /// Directory holding the reference datasets (relative to data_dir)
    #[serde(default = "default_dataset_dir")]
    pub dataset_dir: PathBuf,

    /// JSON file receiving confirmed orders (relative to data_dir)
    #[serde(default = "default_orders_file")]
    pub orders_file: PathBuf,
}

/// Emergency report configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Directory receiving one JSON file per report (relative to data_dir)
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.matchday")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_local_timeout() -> u64 {
    120
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_vision_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    300
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_ollama_vision_model() -> String {
    "llava:7b".to_string()
}

fn default_max_history_chars() -> usize {
    10_000
}

fn default_session_idle_secs() -> u64 {
    1800
}

fn default_max_sessions() -> usize {
    10_000
}

fn default_dataset_dir() -> PathBuf {
    PathBuf::from("datasets")
}

fn default_orders_file() -> PathBuf {
    PathBuf::from("orders.json")
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("reports")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_allow_any: true,
        }
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            vision_model: default_openai_vision_model(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
            vision_model: default_ollama_vision_model(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_history_chars: default_max_history_chars(),
            session_idle_secs: default_session_idle_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl Default for PreorderConfig {
    fn default() -> Self {
        Self {
            dataset_dir: default_dataset_dir(),
            orders_file: default_orders_file(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            reports_dir: default_reports_dir(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            default_provider: "openai".to_string(),
            request_timeout_secs: default_request_timeout(),
            local_timeout_secs: default_local_timeout(),
            openai: OpenAIConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.matchday/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse, validate and process configuration text
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        // Serialize before processing so the file keeps the portable `~` form
        let template = Self::default_config();
        let toml_string = toml::to_string_pretty(&template)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        let mut config = template;
        config.validate_and_process()?;
        Ok(config)
    }

    /// Get the default configuration file path (~/.matchday/config.toml)
    fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".matchday").join("config.toml"))
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            core: CoreConfig {
                log_level: default_log_level(),
                data_dir: default_data_dir(),
            },
            server: ServerConfig::default(),
            llm: LLMConfig::default(),
            memory: MemoryConfig::default(),
            preorder: PreorderConfig::default(),
            report: ReportConfig::default(),
        }
    }

    /// Validate and process configuration
    ///
    /// Checks enumerated values and budgets, expands `~`, resolves store
    /// paths against the data directory and creates the directories the
    /// stores write into.
    fn validate_and_process(&mut self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if !VALID_PROVIDERS.contains(&self.llm.default_provider.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid default provider '{}'. Must be one of: {}",
                self.llm.default_provider,
                VALID_PROVIDERS.join(", ")
            )));
        }

        if self.llm.request_timeout_secs == 0 || self.llm.local_timeout_secs == 0 {
            return Err(EngineError::Config(
                "LLM timeouts must be greater than zero".to_string(),
            ));
        }

        if self.memory.max_history_chars == 0 {
            return Err(EngineError::Config(
                "memory.max_history_chars must be greater than zero".to_string(),
            ));
        }

        if self.memory.session_idle_secs == 0 || self.memory.max_sessions == 0 {
            return Err(EngineError::Config(
                "memory.session_idle_secs and memory.max_sessions must be greater than zero"
                    .to_string(),
            ));
        }

        self.core.data_dir = expand_path(&self.core.data_dir)?;
        self.preorder.dataset_dir = resolve_in(&self.core.data_dir, &self.preorder.dataset_dir)?;
        self.preorder.orders_file = resolve_in(&self.core.data_dir, &self.preorder.orders_file)?;
        self.report.reports_dir = resolve_in(&self.core.data_dir, &self.report.reports_dir)?;

        for dir in [
            &self.core.data_dir,
            &self.preorder.dataset_dir,
            &self.report.reports_dir,
        ] {
            if !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| {
                    EngineError::Config(format!("Failed to create directory {:?}: {}", dir, e))
                })?;
            }
        }

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}

/// Expand `path` and anchor it under `base` unless it is already absolute
fn resolve_in(base: &Path, path: &Path) -> Result<PathBuf, EngineError> {
    let expanded = expand_path(path)?;
    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(base.join(expanded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_creation() {
        let config = Config::default_config();

        assert_eq!(config.core.log_level, "info");
        assert_eq!(config.llm.default_provider, "openai");
        assert_eq!(config.memory.max_history_chars, 10_000);
        assert_eq!(config.memory.session_idle_secs, 1800);
        assert_eq!(config.memory.max_sessions, 10_000);
        assert_eq!(config.server.port, 8000);
        assert!(config.server.cors_allow_any);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test");
        let expanded = expand_path(&path).unwrap();

        let home = dirs::home_dir().unwrap();
        assert_eq!(expanded, home.join("test"));
    }

    #[test]
    fn test_expand_path_without_tilde() {
        let path = PathBuf::from("/absolute/path");
        let expanded = expand_path(&path).unwrap();

        assert_eq!(expanded, path);
    }

    #[test]
    fn test_resolve_relative_store_path() {
        let base = PathBuf::from("/srv/matchday");
        let resolved = resolve_in(&base, Path::new("orders.json")).unwrap();
        assert_eq!(resolved, PathBuf::from("/srv/matchday/orders.json"));

        let absolute = resolve_in(&base, Path::new("/var/orders.json")).unwrap();
        assert_eq!(absolute, PathBuf::from("/var/orders.json"));
    }

    #[test]
    fn test_invalid_provider_rejected() {
        let toml = r#"
[core]
log_level = "info"
data_dir = "/tmp/matchday-config-test"

[llm]
default_provider = "anthropic"
"#;
        let err = Config::from_toml_str(toml).unwrap_err();
        assert!(err.to_string().contains("anthropic"));
    }

    #[test]
    fn test_zero_memory_budget_rejected() {
        let toml = r#"
[core]
data_dir = "/tmp/matchday-config-test"

[llm]
default_provider = "openai"

[memory]
max_history_chars = 0
"#;
        assert!(Config::from_toml_str(toml).is_err());
    }

    #[test]
    fn test_zero_session_limit_rejected() {
        let toml = r#"
[core]
data_dir = "/tmp/matchday-config-test"

[llm]
default_provider = "openai"

[memory]
max_sessions = 0
"#;
        let err = Config::from_toml_str(toml).unwrap_err();
        assert!(err.to_string().contains("max_sessions"));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default_config();
        let toml_string = toml::to_string(&config).unwrap();

        let deserialized: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(config.core.log_level, deserialized.core.log_level);
        assert_eq!(
            config.llm.default_provider,
            deserialized.llm.default_provider
        );
        assert_eq!(
            config.preorder.orders_file,
            deserialized.preorder.orders_file
        );
    }
}
