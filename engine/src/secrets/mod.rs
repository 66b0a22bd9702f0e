pub mod cache;
pub mod string;

pub use cache::SecretCache;
pub use string::SecretString;

use keyring::Entry;
use regex::Regex;
use sdk::errors::EngineError;
use std::sync::OnceLock;

/// Keychain service name all Matchday secrets are stored under
pub const SERVICE_NAME: &str = "matchday";

/// Keychain key of the OpenAI API key
pub const OPENAI_API_KEY: &str = "openai_api_key";

/// SecretManager resolves API keys for the hosted model providers.
///
/// Lookup order:
/// 1. Environment variable named after the key in upper case
///    (`openai_api_key` -> `OPENAI_API_KEY`)
/// 2. OS keychain entry under the configured service name
///
/// A server cannot prompt, so a missing secret is an error rather than an
/// interactive question.
///
/// The SecretManager also scrubs secrets from text before it is logged.
pub struct SecretManager {
    service_name: String,
}

/// Regex patterns for detecting common secret formats.
static SECRET_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

fn get_secret_patterns() -> &'static Vec<Regex> {
    SECRET_PATTERNS.get_or_init(|| {
        [
            // OpenAI API keys, including sk-proj- and sk-test- variants
            r"sk-[a-zA-Z0-9\-_]{20,}",
            // Bearer tokens echoed back in upstream error bodies
            r"Bearer\s+[^\s]{20,}",
        ]
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
    })
}

impl SecretManager {
    /// Creates a new SecretManager with the given keychain service name.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    /// Name of the environment variable consulted for `key`
    pub fn env_var_name(key: &str) -> String {
        key.to_uppercase()
    }

    /// Retrieves a secret from the environment or the OS keychain.
    ///
    /// # Errors
    /// Returns `EngineError::KeyringError` if the secret is absent from both
    /// places or the keychain cannot be read.
    pub fn get_secret(&self, key: &str) -> Result<String, EngineError> {
        if let Ok(value) = std::env::var(Self::env_var_name(key)) {
            if !value.trim().is_empty() {
                tracing::debug!("Retrieved secret '{}' from environment", key);
                return Ok(value.trim().to_string());
            }
        }

        let entry = Entry::new(&self.service_name, key).map_err(|e| {
            EngineError::KeyringError(format!("Failed to create keyring entry: {}", e))
        })?;

        match entry.get_password() {
            Ok(secret) => {
                tracing::debug!("Retrieved secret '{}' from keychain", key);
                Ok(secret)
            }
            Err(keyring::Error::NoEntry) => Err(EngineError::KeyringError(format!(
                "Secret '{}' not found. Set {} or store it in the keychain",
                key,
                Self::env_var_name(key)
            ))),
            Err(e) => Err(EngineError::KeyringError(format!(
                "Failed to retrieve secret '{}': {}",
                key, e
            ))),
        }
    }

    /// Stores a secret in the OS keychain.
    pub fn set_secret(&self, key: &str, value: &str) -> Result<(), EngineError> {
        if value.trim().is_empty() {
            return Err(EngineError::KeyringError(
                "Secret cannot be empty".to_string(),
            ));
        }

        let entry = Entry::new(&self.service_name, key).map_err(|e| {
            EngineError::KeyringError(format!("Failed to create keyring entry: {}", e))
        })?;

        entry.set_password(value).map_err(|e| {
            EngineError::KeyringError(format!("Failed to store secret '{}': {}", key, e))
        })?;

        tracing::info!("Stored secret '{}' in keychain", key);
        Ok(())
    }

    /// Checks whether a secret is available without failing.
    pub fn has_secret(&self, key: &str) -> bool {
        self.get_secret(key).is_ok()
    }

    /// Replaces every detected secret in `text` with `[REDACTED]`.
    ///
    /// # Examples
    /// ```
    /// use matchday_engine::secrets::SecretManager;
    ///
    /// let scrubbed = SecretManager::scrub("My API key is sk-1234567890abcdefghij");
    /// assert_eq!(scrubbed, "My API key is [REDACTED]");
    /// ```
    pub fn scrub(text: &str) -> String {
        let mut result = text.to_string();
        for pattern in get_secret_patterns() {
            result = pattern.replace_all(&result, "[REDACTED]").to_string();
        }
        result
    }
}
