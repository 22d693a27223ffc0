// ── Credential storage ──
//
// A key/value store for the passcode the user typed on a previous run.
// Implementations are blocking (OS keyrings are); the keypad always calls
// them on the blocking pool through `read_passcode`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::warn;

use crate::error::CoreError;

/// Blocking key/value persistence for secrets.
pub trait CredentialStore: Send + Sync {
    /// `Ok(None)` when nothing is stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError>;

    /// Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), CoreError>;
}

/// In-process store, for tests and keyring-less hosts.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with one entry.
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        store
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CoreError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// Read the stored passcode without blocking the async runtime.
///
/// Store failures are logged and reported as "nothing stored".
pub async fn read_passcode(store: Arc<dyn CredentialStore>, key: &str) -> Option<String> {
    let owned_key = key.to_owned();
    let result = tokio::task::spawn_blocking(move || store.get(&owned_key))
        .await
        .map_err(|e| CoreError::Internal(format!("credential read task failed: {e}")))
        .and_then(|inner| inner);

    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "credential store unavailable, treating passcode as absent");
            None
        }
    }
}
