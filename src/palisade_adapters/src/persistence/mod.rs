pub mod in_memory_user_provider;
pub mod sqlx_user_provider;
