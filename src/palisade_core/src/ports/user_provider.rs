use async_trait::async_trait;
use thiserror::Error;

use crate::domain::authenticatable::{Authenticatable, UserRef};
use crate::domain::credentials::Credentials;

#[derive(Debug, Error)]
pub enum UserProviderError {
    #[error("backing store error: {0}")]
    Backend(String),
    #[error("hashing error: {0}")]
    Hash(String),
}

/// Capability for looking up and validating user records against a backing
/// store.
///
/// Read-only: retries and backoff belong to the store's client, not this
/// layer, so backend failures propagate uncaught.
#[async_trait]
pub trait UserProvider: Send + Sync {
    /// Exact-match lookup on the provider's identifier field.
    async fn retrieve_by_id(&self, identifier: &str) -> Result<Option<UserRef>, UserProviderError>;

    /// First match for a conjunctive filter built from the non-password
    /// credential entries.
    ///
    /// Returns `Ok(None)` without querying when the credentials are empty or
    /// contain only a password-like entry.
    async fn retrieve_by_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<UserRef>, UserProviderError>;

    /// Compare the supplied secret against the user's stored hash.
    async fn validate_credentials(
        &self,
        user: &dyn Authenticatable,
        credentials: &Credentials,
    ) -> Result<bool, UserProviderError>;
}

impl std::fmt::Debug for dyn UserProvider + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn UserProvider")
    }
}
