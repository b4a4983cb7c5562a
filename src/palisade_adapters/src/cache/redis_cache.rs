use std::sync::Arc;

use async_trait::async_trait;
use palisade_core::{CacheStore, CacheStoreError};
use redis::{Commands, Connection};
use serde_json::Value;
use tokio::sync::RwLock;

/// Cache store over a Redis connection. Keys carry a prefix so `clear` can
/// stay scoped to this store's entries.
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: Arc<RwLock<Connection>>,
    prefix: String,
}

impl RedisCacheStore {
    pub fn new(conn: Arc<RwLock<Connection>>, prefix: impl Into<String>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
        }
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

fn backend_err(e: impl std::fmt::Display) -> CacheStoreError {
    CacheStoreError::Backend(e.to_string())
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheStoreError> {
        let key = self.key(key);
        let mut conn = self.conn.write().await;

        let payload: Option<String> = conn.get(&key).map_err(backend_err)?;
        payload
            .map(|raw| serde_json::from_str(&raw).map_err(backend_err))
            .transpose()
    }

    async fn set(
        &self,
        key: &str,
        value: Value,
        ttl: Option<std::time::Duration>,
    ) -> Result<(), CacheStoreError> {
        let key = self.key(key);
        let payload = serde_json::to_string(&value).map_err(backend_err)?;

        let mut conn = self.conn.write().await;
        match ttl {
            Some(ttl) => conn
                .set_ex(&key, payload, ttl.as_secs().max(1))
                .map_err(backend_err),
            None => conn.set(&key, payload).map_err(backend_err),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheStoreError> {
        let key = self.key(key);
        let mut conn = self.conn.write().await;

        let removed: usize = conn.del(&key).map_err(backend_err)?;
        Ok(removed > 0)
    }

    async fn clear(&self) -> Result<(), CacheStoreError> {
        let mut conn = self.conn.write().await;

        let keys: Vec<String> = {
            let iter = conn
                .scan_match::<_, String>(format!("{}*", self.prefix))
                .map_err(backend_err)?;
            iter.collect::<Result<_, _>>().map_err(backend_err)?
        };

        if !keys.is_empty() {
            let _: usize = conn.del(&keys).map_err(backend_err)?;
        }
        Ok(())
    }
}
