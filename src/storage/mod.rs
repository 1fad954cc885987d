//! Embedding storage system

pub mod cache;

pub use cache::{CacheStore, EmbeddingCache, FileCacheEntry, JsonCacheStore};
