pub mod config;
pub mod domain;
pub mod error;
pub mod ports;

pub use domain::{
    authenticatable::{Authenticatable, UserRef},
    credentials::{CredentialValue, Credentials},
    token::{Claims, SignedToken},
};

pub use config::{AuthConfig, AuthDefaults, GuardConfig, ProviderConfig};

pub use error::AuthError;

pub use ports::{
    cache::{CacheStore, CacheStoreError},
    cookies::{CookieJar, QueuedCookie},
    guard::{Guard, StatefulGuard, TokenGuard},
    hasher::{Hasher, HasherError},
    request::BearerSource,
    session::{SessionStorage, SessionStoreError},
    token::{TokenCodec, TokenCodecError, TokenStorage},
    user_provider::{UserProvider, UserProviderError},
};
