use async_trait::async_trait;
use secrecy::Secret;

use crate::domain::authenticatable::UserRef;
use crate::domain::credentials::Credentials;
use crate::domain::token::SignedToken;
use crate::error::AuthError;

/// A strategy for answering "who is authenticated on this request" and for
/// performing login/logout transitions.
///
/// This is the complete delegation surface: anything a caller may route
/// through the manager's default guard is listed here explicitly. Extended
/// capabilities are reached through the typed accessors, not dynamic
/// dispatch.
#[async_trait]
pub trait Guard: Send + Sync {
    /// The currently authenticated user, if any. Memoized per guard
    /// instance, including a memoized "none".
    async fn user(&self) -> Result<Option<UserRef>, AuthError>;

    /// Identifier of the currently authenticated user.
    async fn id(&self) -> Result<Option<String>, AuthError> {
        Ok(self.user().await?.map(|user| user.auth_identifier()))
    }

    /// Whether a user is authenticated.
    async fn check(&self) -> Result<bool, AuthError> {
        Ok(self.user().await?.is_some())
    }

    /// Check credentials against the provider without mutating any state.
    async fn validate(&self, credentials: &Credentials) -> Result<bool, AuthError>;

    /// Tear down the authenticated state for this transport.
    async fn logout(&self) -> Result<(), AuthError>;

    /// Access to stateful (session-style) operations, when supported.
    fn as_stateful(&self) -> Option<&dyn StatefulGuard> {
        None
    }

    /// Access to token-issuing operations, when supported.
    fn as_token(&self) -> Option<&dyn TokenGuard> {
        None
    }
}

impl std::fmt::Debug for dyn Guard + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Guard")
    }
}

/// Guards that keep server-side login state.
#[async_trait]
pub trait StatefulGuard: Guard {
    /// Retrieve a user by credentials, validate the secret, and log them in
    /// on success. Failure returns `false` and leaves all state untouched.
    async fn attempt(&self, credentials: &Credentials, remember: bool) -> Result<bool, AuthError>;

    /// Record `user` as authenticated for the current session.
    async fn login(&self, user: UserRef, remember: bool) -> Result<(), AuthError>;
}

/// Guards that authenticate via self-contained signed tokens.
#[async_trait]
pub trait TokenGuard: Guard {
    /// Validate credentials and issue a fresh token on success. Stateless:
    /// nothing is persisted guard-side.
    async fn attempt(&self, credentials: &Credentials)
        -> Result<Option<SignedToken>, AuthError>;

    /// Reject a still-cryptographically-valid token from future `user()`
    /// calls by recording it for its remaining lifetime.
    async fn invalidate(&self, token: &Secret<String>) -> Result<(), AuthError>;
}
