//! Persistent caching of tracker reads.

pub mod file_cache;

pub use file_cache::FileCache;
