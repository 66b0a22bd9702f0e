use super::{
    extract_chat_content, CompletionRequest, ImageCaptioner, ImageInput, LLMError, LLMProvider,
    CAPTION_PROMPT,
};
use crate::config::OpenAIConfig;
use crate::secrets::{SecretCache, OPENAI_API_KEY};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

pub struct OpenAIProvider {
    config: OpenAIConfig,
    secret_cache: Arc<SecretCache>,
    client: reqwest::Client,
    timeout: Duration,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig, secret_cache: Arc<SecretCache>, timeout: Duration) -> Self {
        Self {
            config,
            secret_cache,
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// POST a chat-completions payload and return the reply text
    async fn post_chat(&self, payload: serde_json::Value) -> super::Result<String> {
        let api_key = self
            .secret_cache
            .get_secret(OPENAI_API_KEY)
            .map_err(|e| LLMError::AuthenticationFailed(e.to_string()))?;

        let url = format!("{}/chat/completions", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {}", api_key.unsecure()))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                401 | 403 => LLMError::AuthenticationFailed(text),
                429 => LLMError::RateLimitExceeded,
                _ => LLMError::InvalidRequest(format!("{}: {}", status, text)),
            });
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        extract_chat_content(&data)
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn is_local(&self) -> bool {
        false
    }

    async fn check_health(&self) -> bool {
        self.secret_cache.get_secret(OPENAI_API_KEY).is_ok()
    }

    async fn complete(&self, request: &CompletionRequest) -> super::Result<String> {
        let api_messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|msg| {
                json!({
                    "role": msg.role.to_string(),
                    "content": msg.content
                })
            })
            .collect();

        let mut payload = json!({
            "model": self.config.model,
            "messages": api_messages,
            "max_tokens": request.max_tokens.unwrap_or(self.config.max_tokens),
        });
        if let Some(temperature) = request.temperature {
            payload["temperature"] = json!(temperature);
        }

        tracing::debug!(
            "OpenAI request: model={}, messages={}, total_chars={}",
            self.config.model,
            request.messages.len(),
            request.total_chars()
        );

        self.post_chat(payload).await
    }
}

#[async_trait]
impl ImageCaptioner for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn caption(&self, image: &ImageInput) -> super::Result<String> {
        let payload = json!({
            "model": self.config.vision_model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": CAPTION_PROMPT },
                    { "type": "image_url", "image_url": { "url": image.data_url() } }
                ]
            }],
            "max_tokens": 60,
        });

        let caption = self.post_chat(payload).await?;
        Ok(caption.trim().to_string())
    }
}
