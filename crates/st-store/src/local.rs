//! File-backed local key-value store
//!
//! Stores arbitrary JSON values keyed by string in a single JSON file with
//! restrictive permissions, fronted by an in-memory cache.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::RwLock;

use st_types::{AppError, AppResult};

/// File-backed local storage
///
/// The closest native equivalent of an extension's local storage area:
/// string keys, JSON values, shared by every component of the install.
pub struct LocalStore {
    /// Path to the storage file
    storage_path: PathBuf,
    /// In-memory cache of stored values
    cache: RwLock<HashMap<String, serde_json::Value>>,
}

impl LocalStore {
    /// Create a new local store, loading any existing contents
    ///
    /// # Arguments
    /// * `storage_path` - Path to the backing JSON file
    pub async fn new(storage_path: PathBuf) -> AppResult<Self> {
        let store = Self {
            storage_path,
            cache: RwLock::new(HashMap::new()),
        };

        store.load().await?;

        Ok(store)
    }

    /// Load stored values from disk
    async fn load(&self) -> AppResult<()> {
        if !self.storage_path.exists() {
            return Ok(());
        }

        let content = fs::read_to_string(&self.storage_path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to read local storage: {}", e)))?;

        let values: HashMap<String, serde_json::Value> = serde_json::from_str(&content)
            .map_err(|e| AppError::Storage(format!("Failed to parse local storage: {}", e)))?;

        *self.cache.write().await = values;

        Ok(())
    }

    /// Save stored values to disk
    async fn save(&self) -> AppResult<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.storage_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::Storage(format!("Failed to create storage directory: {}", e))
            })?;
        }

        let cache = self.cache.read().await;
        let content = serde_json::to_string_pretty(&*cache)
            .map_err(|e| AppError::Storage(format!("Failed to serialize local storage: {}", e)))?;

        fs::write(&self.storage_path, content)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write local storage: {}", e)))?;

        // Set file permissions to 0600 (owner read/write only) on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.storage_path)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to get file metadata: {}", e)))?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.storage_path, perms)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to set file permissions: {}", e)))?;
        }

        Ok(())
    }

    /// Store a value under a key, overwriting any existing value
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> AppResult<()> {
        let json = serde_json::to_value(value)
            .map_err(|e| AppError::Storage(format!("Failed to serialize value: {}", e)))?;

        self.cache.write().await.insert(key.to_string(), json);

        self.save().await
    }

    /// Get the value stored under a key, if any
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let cache = self.cache.read().await;
        match cache.get(key) {
            Some(value) => {
                let parsed = serde_json::from_value(value.clone()).map_err(|e| {
                    AppError::Storage(format!("Failed to deserialize value for {}: {}", key, e))
                })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    /// Remove the value stored under a key
    ///
    /// Removing an absent key is not an error.
    pub async fn remove(&self, key: &str) -> AppResult<()> {
        let removed = self.cache.write().await.remove(key).is_some();
        if !removed {
            return Ok(());
        }
        self.save().await
    }

    /// Check whether a key has a stored value
    pub async fn contains(&self, key: &str) -> bool {
        self.cache.read().await.contains_key(key)
    }
}
