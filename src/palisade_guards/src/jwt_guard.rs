use std::sync::Arc;

use async_trait::async_trait;
use palisade_core::{
    AuthError, Authenticatable, BearerSource, Claims, Credentials, Guard, SignedToken, TokenCodec,
    TokenGuard, TokenStorage, UserProvider, UserRef,
};
use secrecy::Secret;
use serde::Deserialize;
use tokio::sync::RwLock;
use uuid::Uuid;

const REVOKED_KEY_PREFIX: &str = "revoked_token:";

fn revocation_key(jti: &Uuid) -> String {
    format!("{REVOKED_KEY_PREFIX}{jti}")
}

/// Driver-specific options read from the guard's configuration entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JwtGuardOptions {
    pub ttl_seconds: i64,
}

impl Default for JwtGuardOptions {
    fn default() -> Self {
        Self { ttl_seconds: 3600 }
    }
}

/// Stateless bearer-token guard: authentication state lives entirely in the
/// signed token, the token storage only tracks revocations.
pub struct JwtGuard {
    name: String,
    provider: Arc<dyn UserProvider>,
    codec: Arc<dyn TokenCodec>,
    storage: Arc<dyn TokenStorage>,
    bearer: Option<Arc<dyn BearerSource>>,
    ttl: chrono::Duration,
    user: RwLock<Option<Option<UserRef>>>,
}

impl JwtGuard {
    pub fn new(
        name: impl Into<String>,
        provider: Arc<dyn UserProvider>,
        codec: Arc<dyn TokenCodec>,
        storage: Arc<dyn TokenStorage>,
        bearer: Option<Arc<dyn BearerSource>>,
        options: JwtGuardOptions,
    ) -> Self {
        Self {
            name: name.into(),
            provider,
            codec,
            storage,
            bearer,
            ttl: chrono::Duration::seconds(options.ttl_seconds),
            user: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Issue a fresh signed token for an already-authenticated user.
    pub fn issue_for(&self, user: &dyn Authenticatable) -> Result<SignedToken, AuthError> {
        let claims = Claims::issue_for(user.auth_identifier(), self.ttl);
        let encoded = self.codec.issue(&claims)?;
        Ok(SignedToken::new(encoded, claims))
    }

    fn presented_token(&self) -> Option<Secret<String>> {
        self.bearer.as_ref().and_then(|source| source.bearer_token())
    }

    async fn is_revoked(&self, claims: &Claims) -> Result<bool, AuthError> {
        // Storage failure propagates: "cannot verify" must not read as
        // "verified".
        Ok(self
            .storage
            .get(&revocation_key(&claims.jti))
            .await?
            .is_some())
    }
}

#[async_trait]
impl Guard for JwtGuard {
    #[tracing::instrument(name = "JwtGuard::user", skip_all, fields(guard = %self.name))]
    async fn user(&self) -> Result<Option<UserRef>, AuthError> {
        if let Some(cached) = self.user.read().await.as_ref() {
            return Ok(cached.clone());
        }

        let resolved = match self.presented_token() {
            Some(token) => match self.codec.verify(&token)? {
                Some(claims) if !self.is_revoked(&claims).await? => {
                    self.provider.retrieve_by_id(&claims.sub).await?
                }
                _ => None,
            },
            None => None,
        };

        *self.user.write().await = Some(resolved.clone());
        Ok(resolved)
    }

    #[tracing::instrument(name = "JwtGuard::validate", skip_all, fields(guard = %self.name))]
    async fn validate(&self, credentials: &Credentials) -> Result<bool, AuthError> {
        let Some(user) = self.provider.retrieve_by_credentials(credentials).await? else {
            return Ok(false);
        };
        Ok(self
            .provider
            .validate_credentials(user.as_ref(), credentials)
            .await?)
    }

    #[tracing::instrument(name = "JwtGuard::logout", skip_all, fields(guard = %self.name))]
    async fn logout(&self) -> Result<(), AuthError> {
        if let Some(token) = self.presented_token() {
            TokenGuard::invalidate(self, &token).await?;
        }
        *self.user.write().await = Some(None);
        Ok(())
    }

    fn as_token(&self) -> Option<&dyn TokenGuard> {
        Some(self)
    }
}

#[async_trait]
impl TokenGuard for JwtGuard {
    #[tracing::instrument(name = "JwtGuard::attempt", skip_all, fields(guard = %self.name))]
    async fn attempt(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<SignedToken>, AuthError> {
        let Some(user) = self.provider.retrieve_by_credentials(credentials).await? else {
            tracing::debug!("no user matched the supplied credentials");
            return Ok(None);
        };

        if !self
            .provider
            .validate_credentials(user.as_ref(), credentials)
            .await?
        {
            tracing::debug!("credential validation failed");
            return Ok(None);
        }

        self.issue_for(user.as_ref()).map(Some)
    }

    #[tracing::instrument(name = "JwtGuard::invalidate", skip_all, fields(guard = %self.name))]
    async fn invalidate(&self, token: &Secret<String>) -> Result<(), AuthError> {
        // Signature check only: a logged-out token may already be expired.
        let Some(claims) = self.codec.peek(token)? else {
            return Ok(());
        };

        let remaining = claims.remaining_seconds();
        if remaining == 0 {
            // Already unusable, nothing to record.
            return Ok(());
        }

        let minutes = (remaining as u64).div_ceil(60);
        self.storage
            .add(
                &revocation_key(&claims.jti),
                serde_json::Value::Bool(true),
                minutes,
            )
            .await?;
        Ok(())
    }
}
