use thiserror::Error;

use crate::ports::cache::CacheStoreError;
use crate::ports::hasher::HasherError;
use crate::ports::session::SessionStoreError;
use crate::ports::token::TokenCodecError;
use crate::ports::user_provider::UserProviderError;

/// Failures surfaced by guard resolution and guard operations.
///
/// Configuration problems are hard failures at resolution time. Backend
/// failures propagate uncaught (fail closed). "Not logged in" and "bad
/// credentials" are never errors; they come back as `Ok(None)` / `Ok(false)`.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("auth guard [{0}] is not defined")]
    UndefinedGuard(String),

    #[error("auth driver [{driver}] for guard [{guard}] is not defined")]
    UndefinedDriver { guard: String, driver: String },

    #[error("auth provider [{0}] is not defined")]
    UndefinedProvider(String),

    #[error("auth provider driver [{driver}] for provider [{provider}] is not defined")]
    UndefinedProviderDriver { provider: String, driver: String },

    #[error("invalid options for guard [{guard}]: {message}")]
    InvalidGuardOptions { guard: String, message: String },

    #[error("invalid options for provider [{provider}]: {message}")]
    InvalidProviderOptions { provider: String, message: String },

    #[error("request environment does not expose {0}")]
    MissingCapability(&'static str),

    #[error(transparent)]
    Provider(#[from] UserProviderError),

    #[error(transparent)]
    Hasher(#[from] HasherError),

    #[error(transparent)]
    Session(#[from] SessionStoreError),

    #[error(transparent)]
    TokenCodec(#[from] TokenCodecError),

    #[error(transparent)]
    TokenStorage(#[from] CacheStoreError),
}
