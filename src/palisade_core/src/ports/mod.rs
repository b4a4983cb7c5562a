pub mod cache;
pub mod cookies;
pub mod guard;
pub mod hasher;
pub mod request;
pub mod session;
pub mod token;
pub mod user_provider;
