//! Time-to-live cache with lazy expiry.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// TTL applied by [`TtlCache::set`].
pub const DEFAULT_TTL: Duration = Duration::from_secs(120);

/// A stored value together with its expiry bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
  pub value: T,
  pub created_at: Instant,
  pub ttl: Duration,
}

impl<T> CacheEntry<T> {
  pub fn new(value: T, ttl: Duration) -> Self {
    Self {
      value,
      created_at: Instant::now(),
      ttl,
    }
  }

  /// A zero TTL never yields a hit; otherwise the entry lives while `age <= ttl`.
  pub fn is_expired(&self, now: Instant) -> bool {
    self.ttl.is_zero() || now.saturating_duration_since(self.created_at) > self.ttl
  }
}

/// Shared in-memory cache.
///
/// Values are stored as JSON so one cache can hold board configurations,
/// sprint collections and whole dashboard snapshots side by side. Cloning
/// the cache yields another handle to the same store; mutation is
/// serialized through a single mutex.
#[derive(Clone, Default)]
pub struct TtlCache {
  entries: Arc<Mutex<HashMap<String, CacheEntry<serde_json::Value>>>>,
}

impl TtlCache {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<serde_json::Value>>> {
    // A panic while holding the lock cannot leave a half-written entry behind,
    // so a poisoned map is still consistent.
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Return the value stored under `key` if present and unexpired.
  ///
  /// An expired entry is removed as a side effect of the lookup.
  pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
    let value = {
      let mut entries = self.lock();
      let expired = entries.get(key)?.is_expired(Instant::now());
      if expired {
        entries.remove(key);
        debug!(key, "cache entry expired");
        return None;
      }
      entries.get(key)?.value.clone()
    };

    match serde_json::from_value(value) {
      Ok(v) => Some(v),
      Err(e) => {
        warn!(key, error = %e, "cached value has unexpected shape, treating as miss");
        None
      }
    }
  }

  /// Store `value` under `key` with the default TTL.
  pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> serde_json::Result<()> {
    self.set_with_ttl(key, value, DEFAULT_TTL)
  }

  /// Store `value` under `key`, replacing any previous entry.
  pub fn set_with_ttl<T: Serialize + ?Sized>(
    &self,
    key: &str,
    value: &T,
    ttl: Duration,
  ) -> serde_json::Result<()> {
    let value = serde_json::to_value(value)?;
    self
      .lock()
      .insert(key.to_string(), CacheEntry::new(value, ttl));
    Ok(())
  }

  /// Remove one entry. Absent keys are ignored.
  pub fn invalidate(&self, key: &str) {
    self.lock().remove(key);
  }

  /// Remove every entry.
  pub fn clear(&self) {
    self.lock().clear();
  }

  /// Number of stored entries, including expired ones not yet read.
  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl std::fmt::Debug for TtlCache {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TtlCache")
      .field("entries", &self.len())
      .finish()
  }
}
