//! Long-lived credential storage
//!
//! Holds the API key produced by a successful OAuth exchange. The flow core
//! writes it here once and forgets it; the chat client reads it directly.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

use crate::local::LocalStore;
use st_types::AppResult;

/// Storage key for the exchanged API key
pub const API_KEY_SLOT: &str = "openrouter_api_key";

/// Persistence surface for the long-lived credential
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persist the API key, replacing any previous one
    async fn store(&self, api_key: &str) -> AppResult<()>;

    /// Load the stored API key, if any
    async fn load(&self) -> AppResult<Option<String>>;

    /// Delete the stored API key. Idempotent.
    async fn clear(&self) -> AppResult<()>;
}

/// Credential slot backed by the shared [`LocalStore`]
pub struct LocalCredentialStore {
    store: Arc<LocalStore>,
}

impl LocalCredentialStore {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CredentialStore for LocalCredentialStore {
    async fn store(&self, api_key: &str) -> AppResult<()> {
        self.store.set(API_KEY_SLOT, &api_key.to_string()).await?;
        debug!("Stored API key");
        Ok(())
    }

    async fn load(&self) -> AppResult<Option<String>> {
        self.store.get(API_KEY_SLOT).await
    }

    async fn clear(&self) -> AppResult<()> {
        self.store.remove(API_KEY_SLOT).await
    }
}

/// In-memory credential slot for tests
#[derive(Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn store(&self, api_key: &str) -> AppResult<()> {
        *self.slot.lock() = Some(api_key.to_string());
        Ok(())
    }

    async fn load(&self) -> AppResult<Option<String>> {
        Ok(self.slot.lock().clone())
    }

    async fn clear(&self) -> AppResult<()> {
        *self.slot.lock() = None;
        Ok(())
    }
}
