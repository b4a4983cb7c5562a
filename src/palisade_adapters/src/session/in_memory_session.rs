use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use palisade_core::{SessionStorage, SessionStoreError};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

struct SessionInner {
    id: Uuid,
    values: HashMap<String, Value>,
}

/// In-process session storage with a UUID session identifier. One instance
/// per request.
#[derive(Clone)]
pub struct InMemorySessionStorage {
    inner: Arc<RwLock<SessionInner>>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(SessionInner {
                id: Uuid::new_v4(),
                values: HashMap::new(),
            })),
        }
    }

    pub async fn id(&self) -> Uuid {
        self.inner.read().await.id
    }
}

impl Default for InMemorySessionStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, SessionStoreError> {
        Ok(self.inner.read().await.values.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<(), SessionStoreError> {
        self.inner.write().await.values.insert(key.to_owned(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SessionStoreError> {
        self.inner.write().await.values.remove(key);
        Ok(())
    }

    async fn regenerate_id(&self) -> Result<(), SessionStoreError> {
        self.inner.write().await.id = Uuid::new_v4();
        Ok(())
    }

    async fn invalidate(&self) -> Result<(), SessionStoreError> {
        let mut inner = self.inner.write().await;
        inner.id = Uuid::new_v4();
        inner.values.clear();
        Ok(())
    }
}
