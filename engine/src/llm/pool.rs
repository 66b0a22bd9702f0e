//! Provider Pool
//!
//! Wraps several `LLMProvider`s behind one. Providers are tried in order,
//! the configured default first, and every attempt runs under its own
//! timeout: local models get the longer local budget, hosted APIs the
//! shorter cloud budget. The first success wins; if every provider fails
//! the pool reports `ProviderUnavailable`.

use super::{CompletionRequest, LLMError, LLMProvider};
use crate::secrets::SecretManager;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Health of a single provider, as reported by `/api/status`
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ProviderHealth {
    pub name: String,
    pub healthy: bool,
}

/// Ordered set of providers with per-attempt timeouts
pub struct ProviderPool {
    providers: Vec<Arc<dyn LLMProvider>>,
    cloud_timeout: Duration,
    local_timeout: Duration,
}

impl ProviderPool {
    /// Create a pool. Providers are attempted in the given order.
    pub fn new(
        providers: Vec<Arc<dyn LLMProvider>>,
        cloud_timeout: Duration,
        local_timeout: Duration,
    ) -> Self {
        Self {
            providers,
            cloud_timeout,
            local_timeout,
        }
    }

    /// Create a pool with the provider named `default_provider` moved to the
    /// front. Relative order of the others is kept.
    pub fn with_default_first(
        mut providers: Vec<Arc<dyn LLMProvider>>,
        default_provider: &str,
        cloud_timeout: Duration,
        local_timeout: Duration,
    ) -> Self {
        providers.sort_by_key(|p| p.name() != default_provider);
        Self::new(providers, cloud_timeout, local_timeout)
    }

    /// Names of the pooled providers in attempt order
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    fn timeout_for(&self, provider: &dyn LLMProvider) -> Duration {
        if provider.is_local() {
            self.local_timeout
        } else {
            self.cloud_timeout
        }
    }

    /// Check the health of every pooled provider
    pub async fn health_report(&self) -> Vec<ProviderHealth> {
        let mut results = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            results.push(ProviderHealth {
                name: provider.name().to_string(),
                healthy: provider.check_health().await,
            });
        }
        results
    }
}

#[async_trait]
impl LLMProvider for ProviderPool {
    fn name(&self) -> &str {
        self.providers.first().map(|p| p.name()).unwrap_or("none")
    }

    fn is_local(&self) -> bool {
        self.providers.first().map(|p| p.is_local()).unwrap_or(false)
    }

    async fn complete(&self, request: &CompletionRequest) -> super::Result<String> {
        if self.providers.is_empty() {
            return Err(LLMError::ProviderUnavailable(
                "No LLM providers configured".to_string(),
            ));
        }

        for provider in &self.providers {
            let timeout = self.timeout_for(provider.as_ref());
            tracing::debug!(
                "Attempting provider: {} (timeout: {}s)",
                provider.name(),
                timeout.as_secs()
            );

            match tokio::time::timeout(timeout, provider.complete(request)).await {
                Ok(Ok(text)) => {
                    tracing::debug!("Provider {} succeeded", provider.name());
                    return Ok(text);
                }
                Ok(Err(e)) => {
                    tracing::warn!(
                        "Provider {} failed: {}",
                        provider.name(),
                        SecretManager::scrub(&e.to_string())
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        "Provider {} timed out after {}s",
                        provider.name(),
                        timeout.as_secs()
                    );
                }
            }
        }

        tracing::error!("All LLM providers exhausted");
        Err(LLMError::ProviderUnavailable(
            "All LLM providers failed".to_string(),
        ))
    }

    async fn check_health(&self) -> bool {
        for provider in &self.providers {
            if provider.check_health().await {
                return true;
            }
        }
        false
    }
}
