//! Topic Agents
//!
//! Each routing label maps to a fixed instruction preamble and an optional
//! static reference dataset. Datasets are read once when the registry is
//! built and never change afterwards. Generation itself is delegated to an
//! `LLMProvider`, so agents hold no network state of their own.

use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

use super::category::Category;
use super::memory::ConversationMemory;
use crate::llm::{CompletionRequest, LLMProvider, Message};
use crate::secrets::SecretManager;

/// Reply used whenever generation fails
pub const APOLOGY: &str =
    "Sorry, I encountered an error while processing your request. Please try again.";

/// Token cap for agent replies
const RESPONSE_MAX_TOKENS: u32 = 300;

/// Static description of one agent
#[derive(Debug, Clone, Copy)]
pub struct AgentProfile {
    pub category: Category,
    pub system_prompt: &'static str,

    /// File name under the dataset directory, if the agent has one
    pub dataset_file: Option<&'static str>,
}

/// The agent table
pub const AGENT_PROFILES: [AgentProfile; 8] = [
    AgentProfile {
        category: Category::Food,
        system_prompt: "You are a helpful food and restaurant assistant for stadium visitors.",
        dataset_file: Some("restaurants.json"),
    },
    AgentProfile {
        category: Category::Sports,
        system_prompt: "You are a sports assistant for match rules and general sports info.",
        dataset_file: Some("fifa_rules.json"),
    },
    AgentProfile {
        category: Category::General,
        system_prompt: "You are a general-purpose assistant.",
        dataset_file: None,
    },
    AgentProfile {
        category: Category::ClubHistory,
        system_prompt: "You are an assistant specialized in international football clubs \
                        related to Saudi Arabia. Provide info on achievements, current team, \
                        FIFA ranking, and current squad.",
        dataset_file: Some("saudi_team.json"),
    },
    AgentProfile {
        category: Category::MatchMoments,
        system_prompt: "You are an assistant specialized in providing key moments of matches \
                        related to Saudi Arabia.",
        dataset_file: Some("key_moments.json"),
    },
    AgentProfile {
        category: Category::PlayerHistory,
        system_prompt: "You provide history for Saudi football players: club career, \
                        personal info, achievements.",
        dataset_file: Some("players.json"),
    },
    AgentProfile {
        category: Category::Chants,
        system_prompt: "You describe or translate chants of the Saudi National Football Team. \
                        Include title, lyrics, and meaning.",
        dataset_file: Some("chants.json"),
    },
    AgentProfile {
        category: Category::PlaceOrder,
        system_prompt: "You are an order assistant. Summarize what the user wants to order \
                        as an Order Summary, then ask them to confirm with yes or no. \
                        Do not claim the order is placed; the system confirms it separately.",
        dataset_file: None,
    },
];

/// A profile with its dataset loaded
#[derive(Debug, Clone)]
pub struct Agent {
    category: Category,
    system_prompt: String,
    dataset: Option<Value>,
}

impl Agent {
    pub fn new(category: Category, system_prompt: impl Into<String>, dataset: Option<Value>) -> Self {
        Self {
            category,
            system_prompt: system_prompt.into(),
            dataset,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn has_dataset(&self) -> bool {
        self.dataset.is_some()
    }

    /// Build the message list for one reply: system prompt, dataset, rendered
    /// history, then the query
    pub fn build_messages(&self, query: &str, memory: &ConversationMemory) -> Vec<Message> {
        let mut messages = Vec::with_capacity(4);
        messages.push(Message::system(self.system_prompt.as_str()));

        if let Some(dataset) = &self.dataset {
            messages.push(Message::system(format!("Dataset info: {}", dataset)));
        }

        messages.push(Message::system(memory.render()));
        messages.push(Message::user(query));
        messages
    }

    /// Generate a reply. Never fails: collaborator errors become `APOLOGY`.
    pub async fn respond(
        &self,
        provider: &dyn LLMProvider,
        query: &str,
        memory: &ConversationMemory,
    ) -> String {
        let request = CompletionRequest::new(self.build_messages(query, memory))
            .with_max_tokens(RESPONSE_MAX_TOKENS);

        match provider.complete(&request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    "Agent {} failed to generate a reply: {}",
                    self.category,
                    SecretManager::scrub(&e.to_string())
                );
                APOLOGY.to_string()
            }
        }
    }
}

/// Every agent, keyed by label
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    agents: HashMap<Category, Agent>,

    /// Served for any label without an entry
    fallback: Agent,
}

impl AgentRegistry {
    /// Build the registry, reading each dataset from `dataset_dir`.
    ///
    /// A missing or unparsable dataset is logged and the agent runs without
    /// one.
    pub fn load(dataset_dir: &Path) -> Self {
        let agents = AGENT_PROFILES
            .iter()
            .map(|profile| {
                let dataset = profile
                    .dataset_file
                    .and_then(|file| load_dataset(&dataset_dir.join(file)));
                (
                    profile.category,
                    Agent::new(profile.category, profile.system_prompt, dataset),
                )
            })
            .collect::<HashMap<_, _>>();

        let loaded = agents.values().filter(|a| a.has_dataset()).count();
        info!(
            "Loaded {} agents ({} with datasets) from {}",
            agents.len(),
            loaded,
            dataset_dir.display()
        );

        Self::from_agents(agents)
    }

    /// Build the registry with no datasets at all
    pub fn without_datasets() -> Self {
        let agents = AGENT_PROFILES
            .iter()
            .map(|p| (p.category, Agent::new(p.category, p.system_prompt, None)))
            .collect();
        Self::from_agents(agents)
    }

    fn from_agents(agents: HashMap<Category, Agent>) -> Self {
        let fallback = agents
            .get(&Category::General)
            .cloned()
            .unwrap_or_else(|| Agent::new(Category::General, "You are a general-purpose assistant.", None));
        Self { agents, fallback }
    }

    /// Agent for a label, falling back to `general`
    pub fn get(&self, category: Category) -> &Agent {
        self.agents.get(&category).unwrap_or(&self.fallback)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

fn load_dataset(path: &Path) -> Option<Value> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Dataset {} not loaded: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str(&content) {
        Ok(value) => {
            debug!("Loaded dataset {}", path.display());
            Some(value)
        }
        Err(e) => {
            warn!("Dataset {} is not valid JSON: {}", path.display(), e);
            None
        }
    }
}
