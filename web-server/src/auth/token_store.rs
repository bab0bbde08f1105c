// web-server/src/auth/token_store.rs
use common::config::AuthMode;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Fixed key the local auth token is stored under. Presence/absence of this
/// key is the sole signal of local-mode authentication state.
pub const LOCAL_TOKEN_STORAGE_KEY: &str = "mc_local_auth_token";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("token storage unavailable")]
    Unavailable,
}

/// Persistent backing for session-scoped values. Implementations may fail
/// (disabled storage, policy restrictions); callers degrade instead of
/// surfacing those failures.
pub trait TokenStorage: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory storage, one per gateway session.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl TokenStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Unavailable)?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Unavailable)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Unavailable)?;
        entries.remove(key);
        Ok(())
    }
}

/// Session-confined holder for the local auth token: a cached value in front
/// of slower persistent storage, with a single writer per session.
///
/// Storage failures are swallowed everywhere: writes and clears still update
/// the cache, reads degrade to "no token".
pub struct LocalTokenStore {
    cached: Option<String>,
    storage: Arc<dyn TokenStorage>,
}

impl LocalTokenStore {
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        Self {
            cached: None,
            storage,
        }
    }

    pub fn set(&mut self, token: String) {
        if let Err(e) = self.storage.write(LOCAL_TOKEN_STORAGE_KEY, &token) {
            tracing::debug!("Ignoring token storage write failure: {}", e);
        }
        self.cached = Some(token);
    }

    pub fn get(&mut self) -> Option<String> {
        if let Some(token) = &self.cached {
            return Some(token.clone());
        }
        match self.storage.read(LOCAL_TOKEN_STORAGE_KEY) {
            Ok(Some(stored)) => {
                self.cached = Some(stored.clone());
                Some(stored)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::debug!("Ignoring token storage read failure: {}", e);
                None
            }
        }
    }

    pub fn clear(&mut self) {
        self.cached = None;
        if let Err(e) = self.storage.remove(LOCAL_TOKEN_STORAGE_KEY) {
            tracing::debug!("Ignoring token storage remove failure: {}", e);
        }
    }

    pub fn has_token(&mut self) -> bool {
        self.get().is_some()
    }

    /// Enforce the configured auth mode on this store. Any token minted under
    /// local auth is stale the moment the process runs in another mode, so it
    /// is cleared rather than left to leak across mode switches.
    pub fn apply_mode(&mut self, mode: AuthMode) {
        if mode != AuthMode::Local {
            self.clear();
        }
    }
}
