pub mod in_memory_cache;
pub mod redis_cache;
