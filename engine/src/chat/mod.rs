//! Preorder chatbot
//!
//! - `memory`: bounded per-session conversation log
//! - `category`: routing labels
//! - `router`: model-driven query classification
//! - `agents`: label -> prompt and dataset table
//! - `orders`: durable order file
//! - `session`: per-session state and locking
//! - `orchestrator`: the request flow and order confirmation

pub mod agents;
pub mod category;
pub mod memory;
pub mod orchestrator;
pub mod orders;
pub mod router;
pub mod session;

pub use agents::{Agent, AgentRegistry, APOLOGY};
pub use category::Category;
pub use memory::ConversationMemory;
pub use orchestrator::{is_affirmative, PreorderAssistant};
pub use orders::{OrderRecord, OrderStore};
pub use router::QueryRouter;
pub use session::{Session, SessionStore};
