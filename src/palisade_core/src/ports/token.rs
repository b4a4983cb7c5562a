use async_trait::async_trait;
use secrecy::Secret;
use serde_json::Value;
use thiserror::Error;

use crate::domain::token::Claims;
use crate::ports::cache::CacheStoreError;

#[derive(Debug, Error)]
#[error("token codec error: {0}")]
pub struct TokenCodecError(pub String);

/// Issues and verifies self-contained signed tokens.
pub trait TokenCodec: Send + Sync {
    fn issue(&self, claims: &Claims) -> Result<Secret<String>, TokenCodecError>;

    /// Full verification: signature and expiry. Expired, malformed or
    /// unsigned tokens are `Ok(None)`, not errors.
    fn verify(&self, token: &Secret<String>) -> Result<Option<Claims>, TokenCodecError>;

    /// Signature-only decode, expiry ignored. Used to blacklist a token that
    /// may already have expired.
    fn peek(&self, token: &Secret<String>) -> Result<Option<Claims>, TokenCodecError>;
}

/// Key/value bookkeeping for issued tokens (blacklisting, TTL tracking).
/// TTLs are expressed in minutes; `forever` stores without expiry.
#[async_trait]
pub trait TokenStorage: Send + Sync {
    async fn add(&self, key: &str, value: Value, minutes: u64) -> Result<(), CacheStoreError>;

    async fn forever(&self, key: &str, value: Value) -> Result<(), CacheStoreError>;

    async fn get(&self, key: &str) -> Result<Option<Value>, CacheStoreError>;

    async fn destroy(&self, key: &str) -> Result<bool, CacheStoreError>;

    async fn flush(&self) -> Result<(), CacheStoreError>;
}
