use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("session store error: {0}")]
    Backend(String),
}

/// Request-scoped key/value session storage.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, SessionStoreError>;

    async fn put(&self, key: &str, value: Value) -> Result<(), SessionStoreError>;

    async fn remove(&self, key: &str) -> Result<(), SessionStoreError>;

    /// Swap the session identifier, keeping the payload. Defeats fixation.
    async fn regenerate_id(&self) -> Result<(), SessionStoreError>;

    /// Drop the payload and swap the identifier.
    async fn invalidate(&self) -> Result<(), SessionStoreError>;
}
