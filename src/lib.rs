//! # Palisade - Multi-Guard Authentication Library
//!
//! This is a facade crate that re-exports the public APIs of the palisade
//! components. Use this crate to get access to the whole authentication
//! stack in one place.
//!
//! ## Usage
//!
//! Add to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! palisade = { path = "../palisade" }
//! ```
//!
//! ## Structure
//!
//! - **Core domain types**: `Credentials`, `Claims`, `SignedToken`, `AuthConfig`, etc.
//! - **Port traits**: `Guard`, `UserProvider`, `SessionStorage`, `TokenCodec`, etc.
//! - **Guards**: `AuthManager`, `AuthContext`, `SessionGuard`, `JwtGuard`
//! - **Adapters**: `SqlxUserProvider`, `RedisCacheStore`, `Argon2Hasher`, etc.

// ============================================================================
// Core Domain Types and Ports
// ============================================================================

/// Core domain types, configuration, and port traits
pub mod core {
    pub use palisade_core::*;
}

pub use palisade_core::{
    AuthConfig, AuthDefaults, AuthError, Authenticatable, Claims, CredentialValue, Credentials,
    GuardConfig, ProviderConfig, SignedToken, UserRef,
};

/// Port trait definitions
pub mod ports {
    pub use palisade_core::{
        BearerSource, CacheStore, CacheStoreError, CookieJar, Guard, Hasher, HasherError,
        QueuedCookie, SessionStorage, SessionStoreError, StatefulGuard, TokenCodec,
        TokenCodecError, TokenGuard, TokenStorage, UserProvider, UserProviderError,
    };
}

pub use palisade_core::{
    BearerSource, CacheStore, CookieJar, Guard, Hasher, SessionStorage, StatefulGuard, TokenCodec,
    TokenGuard, TokenStorage, UserProvider,
};

// ============================================================================
// Guards and Resolution
// ============================================================================

/// Guard implementations and the manager/context resolution layer
pub mod guards {
    pub use palisade_guards::*;
}

pub use palisade_guards::{
    AuthContext, AuthManager, AuthManagerBuilder, CacheTokenStorage, DefaultUserResolver,
    GuardFactory, GuardSpec, JwtGuard, JwtGuardOptions, ProviderFactory, RequestEnv, ResolvesUser,
    SessionGuard,
};

// ============================================================================
// Adapters (Infrastructure)
// ============================================================================

/// Infrastructure adapters for the port traits
pub mod adapters {
    pub use palisade_adapters::*;
}

pub use palisade_adapters::{
    Argon2Hasher, HeaderBearerSource, InMemoryCacheStore, InMemorySessionStorage,
    InMemoryUserProvider, JsonwebtokenCodec, MemoryUser, QueuedCookieJar, RedisCacheStore,
    Settings, SqlxUserProvider, load_settings, memory_provider_factory, sqlx_provider_factory,
};
