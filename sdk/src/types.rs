//! Request/response types for the chat and report endpoints

use serde::{Deserialize, Serialize};

/// One user/bot exchange in a preorder conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub user: String,
    pub bot: String,
}

impl Turn {
    /// Create a new turn
    pub fn new(user: impl Into<String>, bot: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            bot: bot.into(),
        }
    }
}

/// Body of `POST /pchat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub query: String,

    /// Conversation history held by the client. Sent as `[]` at the start of
    /// a conversation.
    #[serde(default)]
    pub memory_input: Vec<Turn>,

    /// Session to continue. A new one is opened when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Reply of `POST /pchat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub memory: Vec<Turn>,
    pub category: String,
    pub session_id: String,

    /// Order text still waiting for a "yes"
    #[serde(default)]
    pub pending_order: Option<String>,
}

/// Role-tagged message in an emergency report conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationItem {
    pub role: String,
    pub content: String,
}

impl ConversationItem {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Body of `POST /rchat`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub message: Option<String>,

    /// Base64 image, optionally with a `data:<mime>;base64,` prefix
    #[serde(default)]
    pub image_data: Option<String>,

    #[serde(default)]
    pub conversation_history: Vec<ConversationItem>,
}

/// Reply of `POST /rchat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResponse {
    pub response: String,
    pub conversation: Vec<ConversationItem>,
    pub report_saved: bool,
    pub report_path: Option<String>,
}
