use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("cache store error: {0}")]
    Backend(String),
}

/// Generic cache capability backing the token store. The implementation is
/// the only resource shared across request tasks and must provide atomic
/// get/set/delete on its own.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheStoreError>;

    async fn set(
        &self,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> Result<(), CacheStoreError>;

    /// Returns whether the key existed.
    async fn delete(&self, key: &str) -> Result<bool, CacheStoreError>;

    async fn clear(&self) -> Result<(), CacheStoreError>;
}
