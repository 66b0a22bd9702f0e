//! Ollama LLM Provider
//!
//! Implements `LLMProvider` and `ImageCaptioner` for Ollama, which runs
//! models on the local machine (typically at http://localhost:11434).
//!
//! Key features:
//! - Local execution (no API keys required)
//! - Non-streaming `/api/chat` calls
//! - Captioning through a vision model via the `images` message field

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{
    CompletionRequest, ImageCaptioner, ImageInput, LLMError, LLMProvider, Message, Result,
    CAPTION_PROMPT,
};

/// Ollama provider configuration
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    /// Base URL for Ollama API (typically http://localhost:11434)
    base_url: String,

    /// Chat model name (e.g., "llama3.1:8b")
    model: String,

    /// Vision model name (e.g., "llava:7b")
    vision_model: String,

    client: Client,

    timeout: Duration,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Arguments
    /// * `base_url` - Base URL for Ollama API (e.g., "http://localhost:11434")
    /// * `model` - Model name to use (e.g., "llama3.1:8b")
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            base_url: base_url.into(),
            vision_model: model.clone(),
            model,
            client: Client::new(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_vision_model(mut self, vision_model: impl Into<String>) -> Self {
        self.vision_model = vision_model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Convert our Message format to Ollama's format
    fn convert_messages(&self, messages: &[Message]) -> Vec<OllamaMessage> {
        messages
            .iter()
            .map(|msg| OllamaMessage {
                role: msg.role.to_string(),
                content: msg.content.clone(),
                images: None,
            })
            .collect()
    }

    async fn chat(&self, request: OllamaRequest) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let start = std::time::Instant::now();

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Timeout
                } else if e.is_connect() {
                    LLMError::ProviderUnavailable(format!(
                        "Cannot connect to Ollama at {}. Is Ollama running?",
                        self.base_url
                    ))
                } else {
                    LLMError::NetworkError(e.to_string())
                }
            })?;

        tracing::debug!(
            "Ollama response received in {:.1}s",
            start.elapsed().as_secs_f64()
        );

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LLMError::ProviderUnavailable(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(format!("Failed to parse Ollama response: {}", e)))?;

        Ok(ollama_response.message.content)
    }
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn is_local(&self) -> bool {
        true
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let messages = self.convert_messages(&request.messages);

        tracing::debug!(
            "Ollama request: model={}, messages={}, total_chars={}",
            self.model,
            messages.len(),
            request.total_chars()
        );

        let options = if request.max_tokens.is_some() || request.temperature.is_some() {
            Some(OllamaOptions {
                num_predict: request.max_tokens,
                temperature: request.temperature,
            })
        } else {
            None
        };

        self.chat(OllamaRequest {
            model: self.model.clone(),
            messages,
            stream: false,
            options,
        })
        .await
    }

    async fn check_health(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl ImageCaptioner for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn caption(&self, image: &ImageInput) -> Result<String> {
        let caption = self
            .chat(OllamaRequest {
                model: self.vision_model.clone(),
                messages: vec![OllamaMessage {
                    role: "user".to_string(),
                    content: CAPTION_PROMPT.to_string(),
                    images: Some(vec![image.to_base64()]),
                }],
                stream: false,
                options: None,
            })
            .await?;
        Ok(caption.trim().to_string())
    }
}

/// Ollama API request format
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Ollama message format
#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    images: Option<Vec<String>>,
}

/// Ollama API response format
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_provider_properties() {
        let provider = OllamaProvider::new("http://localhost:11434", "llama3.1:8b");

        assert_eq!(LLMProvider::name(&provider), "ollama");
        assert!(provider.is_local());
        assert_eq!(provider.vision_model, "llama3.1:8b");

        let provider = provider.with_vision_model("llava:7b");
        assert_eq!(provider.vision_model, "llava:7b");
    }

    #[test]
    fn test_message_conversion() {
        let provider = OllamaProvider::new("http://localhost:11434", "llama3.1:8b");

        let messages = vec![
            Message::system("You are a helpful assistant"),
            Message::user("Hello"),
            Message::assistant("Hi there"),
        ];

        let ollama_messages = provider.convert_messages(&messages);

        assert_eq!(ollama_messages.len(), 3);
        assert_eq!(ollama_messages[0].role, "system");
        assert_eq!(ollama_messages[1].role, "user");
        assert_eq!(ollama_messages[2].role, "assistant");
        assert!(ollama_messages.iter().all(|m| m.images.is_none()));
    }

    #[test]
    fn test_request_omits_empty_options() {
        let request = OllamaRequest {
            model: "m".to_string(),
            messages: vec![],
            stream: false,
            options: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("options").is_none());
    }
}
