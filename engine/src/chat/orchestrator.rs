//! Preorder Assistant
//!
//! Ties routing, agents, memory and order confirmation together for one
//! request at a time per session.
//!
//! A session is either idle or awaiting confirmation of a pending order.
//! Routing a query to `place_order` parks the query as the pending order.
//! An affirmative reply ("yes", "ok", "نعم", ...) with no negation in it,
//! while an order is pending, persists the order and answers with the order
//! number without calling the model. Any other query while an order is
//! pending abandons it, unless it is itself a new order.

use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use sdk::errors::EngineError;
use sdk::types::{ChatRequest, ChatResponse, Turn};

use super::agents::AgentRegistry;
use super::category::Category;
use super::orders::OrderStore;
use super::router::QueryRouter;
use super::session::{Session, SessionStore};
use crate::llm::LLMProvider;

/// Words that confirm a pending order
const AFFIRMATIVE_WORDS: [&str; 9] = [
    "yes", "yeah", "yep", "confirm", "confirmed", "sure", "ok", "okay", "نعم",
];

/// Words that turn an otherwise affirmative reply into a refusal
const NEGATION_WORDS: [&str; 12] = [
    "no", "not", "nope", "never", "don't", "dont", "cancel", "stop", "wait", "isn't", "لا",
    "ليس",
];

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '\u{2019}'))
        .map(|word| word.trim_matches(|c: char| c == '\'' || c == '\u{2019}'))
        .filter(|word| !word.is_empty())
        .map(|word| word.to_lowercase().replace('\u{2019}', "'"))
}

/// True if the text confirms: it contains a confirmation word as a whole
/// word and no negation word.
///
/// "Yes please" and "ok!" confirm; "yesterday", "bookkeeping" and
/// "no, I'm not sure yet" do not.
pub fn is_affirmative(text: &str) -> bool {
    let mut affirmed = false;
    for word in words(text) {
        if NEGATION_WORDS.contains(&word.as_str()) {
            return false;
        }
        affirmed |= AFFIRMATIVE_WORDS.contains(&word.as_str());
    }
    affirmed
}

/// Text sent back once an order has been persisted
pub fn confirmation_message(order_number: u64) -> String {
    format!(
        "Your order has been placed successfully. Your order number is: {}.",
        order_number
    )
}

pub struct PreorderAssistant {
    provider: Arc<dyn LLMProvider>,
    router: QueryRouter,
    agents: AgentRegistry,
    orders: Arc<OrderStore>,
    sessions: SessionStore,
}

impl PreorderAssistant {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        agents: AgentRegistry,
        orders: Arc<OrderStore>,
        sessions: SessionStore,
    ) -> Self {
        Self {
            router: QueryRouter::new(Arc::clone(&provider)),
            provider,
            agents,
            orders,
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn orders(&self) -> &OrderStore {
        &self.orders
    }

    /// Handle a `/pchat` request body
    pub async fn handle_request(&self, request: ChatRequest) -> Result<ChatResponse, EngineError> {
        self.handle(request.session_id, &request.query, request.memory_input)
            .await
    }

    /// Process one visitor query.
    ///
    /// `prior_memory`, when non-empty, replaces the session's history before
    /// the query is handled. A session id is generated when none is given.
    ///
    /// # Errors
    /// * `EngineError::InvalidInput` - the query is empty
    /// * `EngineError::OrderStore` - a confirmed order could not be saved;
    ///   the order stays pending so the visitor can confirm again
    pub async fn handle(
        &self,
        session_id: Option<String>,
        query: &str,
        prior_memory: Vec<Turn>,
    ) -> Result<ChatResponse, EngineError> {
        if query.trim().is_empty() {
            return Err(EngineError::InvalidInput(
                "query must not be empty".to_string(),
            ));
        }

        let session_id = session_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let handle = self.sessions.get_or_create(&session_id);
        let mut session = handle.lock().await;

        if !prior_memory.is_empty() {
            session.memory.replace(prior_memory);
        }

        let (response, category) = match session.pending_order.clone() {
            Some(pending) if is_affirmative(query) => {
                self.confirm_order(&session_id, &mut session, query, &pending)
                    .await?
            }
            _ => self.answer(&session_id, &mut session, query).await,
        };

        Ok(ChatResponse {
            response,
            memory: session.memory.turns(),
            category: category.to_string(),
            session_id,
            pending_order: session.pending_order.clone(),
        })
    }

    async fn confirm_order(
        &self,
        session_id: &str,
        session: &mut Session,
        query: &str,
        pending: &str,
    ) -> Result<(String, Category), EngineError> {
        let order_number = self.orders.save_order(pending).await?;
        info!("Session {} confirmed order #{}", session_id, order_number);

        let response = confirmation_message(order_number);
        session.memory.append(query, response.as_str());
        session.pending_order = None;
        Ok((response, Category::PlaceOrder))
    }

    async fn answer(
        &self,
        session_id: &str,
        session: &mut Session,
        query: &str,
    ) -> (String, Category) {
        let category = self.router.classify(query).await;
        let response = self
            .agents
            .get(category)
            .respond(self.provider.as_ref(), query, &session.memory)
            .await;
        session.memory.append(query, response.as_str());

        if category == Category::PlaceOrder {
            debug!("Session {} awaiting order confirmation", session_id);
            session.pending_order = Some(query.to_string());
        } else if let Some(abandoned) = session.pending_order.take() {
            info!(
                "Session {} abandoned pending order {:?} (query routed to {})",
                session_id, abandoned, category
            );
        }

        (response, category)
    }
}
