//! Matchday Engine Library
//!
//! This library provides the core functionality of the Matchday stadium
//! assistant. It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Secret management module
pub mod secrets;

/// LLM provider abstraction layer
pub mod llm;

/// Preorder chatbot: memory, routing, agents, orders and sessions
pub mod chat;

/// Emergency reporting chatbot
pub mod report;

/// Wiring from configuration to running chatbots
pub mod app;

/// HTTP API
pub mod server;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
