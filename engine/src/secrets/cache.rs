use crate::secrets::string::SecretString;
use crate::secrets::SecretManager;
use sdk::errors::EngineError;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// In-memory cache in front of `SecretManager`.
///
/// `OpenAIProvider` looks its key up on every request and health check;
/// the environment and the keychain are only consulted on the first lookup.
#[derive(Clone)]
pub struct SecretCache {
    manager: Arc<SecretManager>,
    cache: Arc<RwLock<HashMap<String, SecretString>>>,
}

impl SecretCache {
    pub fn new(manager: Arc<SecretManager>) -> Self {
        Self {
            manager,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Cache pre-filled with fixed values, bypassing the manager for those keys
    pub fn with_static(manager: Arc<SecretManager>, entries: &[(&str, &str)]) -> Self {
        let cache = Self::new(manager);
        {
            let mut map = cache.cache.write().unwrap_or_else(|e| e.into_inner());
            for (key, value) in entries {
                map.insert((*key).to_string(), SecretString::new(*value));
            }
        }
        cache
    }

    /// Retrieves a secret, consulting the manager on a cache miss.
    pub fn get_secret(&self, key: &str) -> Result<SecretString, EngineError> {
        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(secret) = cache.get(key) {
                return Ok(secret.clone());
            }
        }

        let secret = SecretString::new(self.manager.get_secret(key)?);

        {
            let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
            cache.insert(key.to_string(), secret.clone());
        }

        Ok(secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_entries_served_from_cache() {
        let manager = Arc::new(SecretManager::new("matchday-test"));
        let cache = SecretCache::with_static(manager, &[("openai_api_key", "sk-test")]);
        let secret = cache.get_secret("openai_api_key").unwrap();
        assert_eq!(secret.unsecure(), "sk-test");
    }
}
