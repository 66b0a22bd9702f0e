//! Query Router
//!
//! Asks the model which label a visitor query belongs to. Classification
//! never fails from the caller's point of view: provider errors and replies
//! that name no known label both resolve to `general`.

use std::sync::Arc;
use tracing::{debug, warn};

use super::category::Category;
use crate::llm::{CompletionRequest, LLMProvider, Message};
use crate::secrets::SecretManager;

/// Labels are single words; anything longer is noise
const CLASSIFY_MAX_TOKENS: u32 = 10;

pub struct QueryRouter {
    provider: Arc<dyn LLMProvider>,
    instruction: String,
}

impl QueryRouter {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            instruction: classification_instruction(),
        }
    }

    /// The fixed instruction sent ahead of every query
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Classify a query into one of the known labels
    pub async fn classify(&self, query: &str) -> Category {
        let request = CompletionRequest::new(vec![
            Message::system(self.instruction.as_str()),
            Message::user(query),
        ])
        .with_max_tokens(CLASSIFY_MAX_TOKENS);

        let reply = match self.provider.complete(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    "Routing failed, using {}: {}",
                    Category::General,
                    SecretManager::scrub(&e.to_string())
                );
                return Category::General;
            }
        };

        match Category::from_reply(&reply) {
            Some(category) => {
                debug!("Query routed to {}", category);
                category
            }
            None => {
                debug!("Unrecognized label {:?}, using {}", reply.trim(), Category::General);
                Category::General
            }
        }
    }
}

fn classification_instruction() -> String {
    let labels = Category::ALL
        .iter()
        .map(|c| format!("- {}", c.as_str()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Classify the query into one of the following categories:\n{}\n\
         Respond only with one of the category names above and nothing else.",
        labels
    )
}
