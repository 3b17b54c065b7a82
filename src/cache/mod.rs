//! In-memory caching for aggregated Jira data.
//!
//! This module provides a process-local key/value store that:
//! - Stores any serializable value under a string key
//! - Gives every entry its own time-to-live
//! - Expires entries lazily when they are next read (no background sweep)
//! - Can be shared between concurrent fetch tasks through cheap clones

mod ttl;

pub use ttl::{CacheEntry, TtlCache, DEFAULT_TTL};
