use async_trait::async_trait;
use secrecy::Secret;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("hashing error: {0}")]
pub struct HasherError(pub String);

/// Password hashing capability. Verification may be CPU-heavy, so both
/// operations are async and expected to run off the executor threads.
#[async_trait]
pub trait Hasher: Send + Sync {
    async fn check(
        &self,
        plain: &Secret<String>,
        hashed: &Secret<String>,
    ) -> Result<bool, HasherError>;

    async fn hash(&self, plain: &Secret<String>) -> Result<Secret<String>, HasherError>;
}
