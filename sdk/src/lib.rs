//! Matchday SDK
//!
//! Shared library providing the error type and the request/response shapes
//! used by the Matchday engine and by anything that talks to its HTTP API.

/// Error types and handling
pub mod errors;

/// Wire types for the chat and report endpoints
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, MatchdayErrorExt};
pub use types::{
    ChatRequest, ChatResponse, ConversationItem, ReportRequest, ReportResponse, Turn,
};
