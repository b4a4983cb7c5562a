pub mod cache;
pub mod config;
pub mod hashing;
pub mod http;
pub mod jwt;
pub mod persistence;
pub mod session;

pub use cache::{in_memory_cache::InMemoryCacheStore, redis_cache::RedisCacheStore};
pub use config::settings::{Settings, load_settings};
pub use hashing::argon2_hasher::Argon2Hasher;
pub use http::{cookie_jar::QueuedCookieJar, header_bearer::HeaderBearerSource};
pub use jwt::jsonwebtoken_codec::JsonwebtokenCodec;
pub use persistence::{
    in_memory_user_provider::{InMemoryUserProvider, MemoryUser, memory_provider_factory},
    sqlx_user_provider::{Columns, SqlxUserProvider, sqlx_provider_factory},
};
pub use session::in_memory_session::InMemorySessionStorage;
