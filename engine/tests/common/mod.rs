//! Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use matchday_engine::config::Config;
use matchday_engine::llm::{CompletionRequest, LLMError, LLMProvider};

/// Provider that answers classification requests by keyword and every other
/// request with a fixed reply.
pub struct ScriptedProvider {
    /// (keyword in query, label) pairs, first match wins
    labels: Vec<(&'static str, &'static str)>,

    /// Generation reply; `None` makes generation fail
    reply: Option<String>,

    classify_fails: bool,

    pub classify_calls: AtomicUsize,
    pub respond_calls: AtomicUsize,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(labels: Vec<(&'static str, &'static str)>, reply: &str) -> Self {
        Self {
            labels,
            reply: Some(reply.to_string()),
            classify_fails: false,
            classify_calls: AtomicUsize::new(0),
            respond_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails
    pub fn failing() -> Self {
        Self {
            labels: Vec::new(),
            reply: None,
            classify_fails: true,
            classify_calls: AtomicUsize::new(0),
            respond_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn total_calls(&self) -> usize {
        self.classify_calls.load(Ordering::SeqCst) + self.respond_calls.load(Ordering::SeqCst)
    }

    fn is_classification(request: &CompletionRequest) -> bool {
        request
            .messages
            .first()
            .map(|m| m.content.starts_with("Classify the query"))
            .unwrap_or(false)
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn is_local(&self) -> bool {
        true
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LLMError> {
        self.requests.lock().unwrap().push(request.clone());

        if Self::is_classification(request) {
            self.classify_calls.fetch_add(1, Ordering::SeqCst);
            if self.classify_fails {
                return Err(LLMError::Timeout);
            }
            let query = request
                .messages
                .last()
                .map(|m| m.content.to_lowercase())
                .unwrap_or_default();
            let label = self
                .labels
                .iter()
                .find(|(keyword, _)| query.contains(keyword))
                .map(|(_, label)| *label)
                .unwrap_or("no idea");
            return Ok(label.to_string());
        }

        self.respond_calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .clone()
            .ok_or_else(|| LLMError::RateLimitExceeded)
    }
}

/// Configuration rooted in a temporary directory
pub fn test_config(data_dir: &Path) -> Config {
    let toml = format!(
        r#"
[core]
log_level = "debug"
data_dir = "{}"

[llm]
default_provider = "ollama"
request_timeout_secs = 5
local_timeout_secs = 5
"#,
        data_dir.display()
    );
    Config::from_toml_str(&toml).unwrap()
}
