//! Error types and handling
//!
//! This module provides the error types used throughout the Matchday engine.
//! All errors implement the `MatchdayErrorExt` trait which provides
//! user-friendly hints and indicates whether errors are recoverable.
//!
//! # Security
//!
//! Hints are static strings. They never echo API keys, file paths or the
//! raw text of an upstream model error back to a visitor.

use thiserror::Error;

/// Trait for Matchday error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait MatchdayErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to display to end users and does not contain:
    /// - Secrets (API keys, tokens, passwords)
    /// - File paths
    /// - Internal implementation details
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried or worked around. Non-recoverable
    /// errors typically require manual intervention or a restart.
    fn is_recoverable(&self) -> bool;

    /// Returns whether the caller caused the error (bad input) rather than
    /// the server.
    fn is_client_error(&self) -> bool {
        false
    }
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: Invalid or missing configuration
/// - **Input**: Malformed caller requests
/// - **Persistence**: Order and report storage failures
/// - **Secrets**: Keychain access failures
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, MatchdayErrorExt};
///
/// let error = EngineError::InvalidInput("query must not be empty".to_string());
/// assert!(error.is_client_error());
/// assert!(error.is_recoverable());
///
/// let fatal = EngineError::Config("bad log level".to_string());
/// assert!(!fatal.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Caller input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Persistence errors
    #[error("Order store error: {0}")]
    OrderStore(String),

    #[error("Report store error: {0}")]
    ReportStore(String),

    // Keyring errors
    #[error("Keyring error: {0}")]
    KeyringError(String),

    // Network errors
    #[error("Network error: {0}")]
    Network(String),
}

impl MatchdayErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",
            Self::InvalidInput(_) => "The request was malformed. Check the required fields",
            Self::OrderStore(_) => "Your order could not be saved. Please confirm again",
            Self::ReportStore(_) => "Your report could not be saved. Please send it again",
            Self::KeyringError(_) => "Failed to access secure storage. Check system keychain",
            Self::Network(_) => "Network operation failed. Check your connection",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }

    fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistence_errors_are_server_side_and_recoverable() {
        let order = EngineError::OrderStore("disk full".to_string());
        assert!(!order.is_client_error());
        assert!(order.is_recoverable());
        assert!(!order.user_hint().contains("disk full"));

        let report = EngineError::ReportStore("permission denied".to_string());
        assert!(!report.is_client_error());
        assert!(report.is_recoverable());
    }

    #[test]
    fn test_only_invalid_input_is_client_error() {
        let errs = [
            EngineError::Config("x".to_string()),
            EngineError::OrderStore("x".to_string()),
            EngineError::ReportStore("x".to_string()),
            EngineError::KeyringError("x".to_string()),
            EngineError::Network("x".to_string()),
        ];
        for err in errs {
            assert!(!err.is_client_error(), "{:?}", err);
        }
        assert!(EngineError::InvalidInput("x".to_string()).is_client_error());
    }

    #[test]
    fn test_display_includes_detail() {
        let err = EngineError::InvalidInput("query".to_string());
        assert_eq!(err.to_string(), "Invalid input: query");
    }
}
