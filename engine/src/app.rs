//! Application Context
//!
//! Builds both chatbots from a loaded `Config`: secrets, providers, the
//! provider pool, agent datasets and the two stores. The HTTP server and
//! the CLI share this wiring.

use std::sync::Arc;
use std::time::Duration;

use sdk::errors::EngineError;

use crate::chat::{AgentRegistry, OrderStore, PreorderAssistant, SessionStore};
use crate::config::Config;
use crate::llm::ollama::OllamaProvider;
use crate::llm::openai::OpenAIProvider;
use crate::llm::pool::{ProviderHealth, ProviderPool};
use crate::llm::{ImageCaptioner, LLMProvider};
use crate::report::{EmergencyReporter, ReportStore};
use crate::secrets::{SecretCache, SecretManager, OPENAI_API_KEY, SERVICE_NAME};

/// Everything a request handler needs
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub pool: Arc<ProviderPool>,
    pub preorder: Arc<PreorderAssistant>,
    pub reporter: Arc<EmergencyReporter>,
}

impl AppContext {
    /// Wire up providers and stores from configuration.
    ///
    /// OpenAI joins the pool only when an API key can be found; Ollama is
    /// always present as the local fallback. The captioner follows the same
    /// preference.
    pub fn from_config(config: Config) -> Result<Self, EngineError> {
        let manager = Arc::new(SecretManager::new(SERVICE_NAME));
        let has_openai_key = manager.has_secret(OPENAI_API_KEY);
        let secrets = Arc::new(SecretCache::new(manager));

        let cloud_timeout = Duration::from_secs(config.llm.request_timeout_secs);
        let local_timeout = Duration::from_secs(config.llm.local_timeout_secs);

        let ollama = Arc::new(
            OllamaProvider::new(
                config.llm.ollama.base_url.as_str(),
                config.llm.ollama.model.as_str(),
            )
            .with_vision_model(config.llm.ollama.vision_model.as_str())
            .with_timeout(local_timeout),
        );

        let mut providers: Vec<Arc<dyn LLMProvider>> = Vec::new();
        let captioner: Arc<dyn ImageCaptioner> = if has_openai_key {
            let openai = Arc::new(OpenAIProvider::new(
                config.llm.openai.clone(),
                secrets,
                cloud_timeout,
            ));
            providers.push(Arc::clone(&openai) as Arc<dyn LLMProvider>);
            openai as Arc<dyn ImageCaptioner>
        } else {
            tracing::warn!(
                "No OpenAI API key found (set {} or store it in the keychain); using Ollama only",
                SecretManager::env_var_name(OPENAI_API_KEY)
            );
            Arc::clone(&ollama) as Arc<dyn ImageCaptioner>
        };
        providers.push(ollama);

        let pool = ProviderPool::with_default_first(
            providers,
            &config.llm.default_provider,
            cloud_timeout,
            local_timeout,
        );
        tracing::info!("LLM providers: {}", pool.provider_names().join(", "));

        Ok(Self::with_providers(config, Arc::new(pool), Some(captioner)))
    }

    /// Build the chatbots around an existing pool and captioner
    pub fn with_providers(
        config: Config,
        pool: Arc<ProviderPool>,
        captioner: Option<Arc<dyn ImageCaptioner>>,
    ) -> Self {
        let provider: Arc<dyn LLMProvider> = Arc::clone(&pool) as Arc<dyn LLMProvider>;

        let agents = AgentRegistry::load(&config.preorder.dataset_dir);
        let orders = Arc::new(OrderStore::new(config.preorder.orders_file.clone()));
        let preorder = PreorderAssistant::new(
            Arc::clone(&provider),
            agents,
            orders,
            SessionStore::with_limits(
                config.memory.max_history_chars,
                Duration::from_secs(config.memory.session_idle_secs),
                config.memory.max_sessions,
            ),
        );

        let reporter = EmergencyReporter::new(
            provider,
            captioner,
            ReportStore::new(config.report.reports_dir.clone()),
        );

        Self {
            config: Arc::new(config),
            pool,
            preorder: Arc::new(preorder),
            reporter: Arc::new(reporter),
        }
    }

    pub async fn provider_health(&self) -> Vec<ProviderHealth> {
        self.pool.health_report().await
    }
}
