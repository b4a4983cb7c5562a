use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use palisade_core::{CacheStore, CacheStoreError, TokenStorage};
use serde_json::Value;

/// Token bookkeeping over an injected generic cache.
///
/// Minutes-based TTLs from the token layer are translated to the cache's
/// second-based expiry; everything else is a pass-through.
#[derive(Clone)]
pub struct CacheTokenStorage {
    cache: Arc<dyn CacheStore>,
}

impl CacheTokenStorage {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl TokenStorage for CacheTokenStorage {
    async fn add(&self, key: &str, value: Value, minutes: u64) -> Result<(), CacheStoreError> {
        self.cache
            .set(key, value, Some(Duration::from_secs(minutes * 60)))
            .await
    }

    async fn forever(&self, key: &str, value: Value) -> Result<(), CacheStoreError> {
        self.cache.set(key, value, None).await
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, CacheStoreError> {
        self.cache.get(key).await
    }

    async fn destroy(&self, key: &str) -> Result<bool, CacheStoreError> {
        self.cache.delete(key).await
    }

    async fn flush(&self) -> Result<(), CacheStoreError> {
        self.cache.clear().await
    }
}
