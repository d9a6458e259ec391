//! Instance-scoped result cache used by [`Query`](super::Query).

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
struct CacheEntry<T> {
  data: T,
  stored_at: Instant,
}

/// Time-boxed cache table keyed by cache key.
///
/// Expired entries are evicted lazily on lookup; nothing sweeps the table in
/// the background.
#[derive(Debug)]
pub struct QueryCache<T> {
  entries: HashMap<String, CacheEntry<T>>,
  ttl: Duration,
}

impl<T> QueryCache<T> {
  pub fn new(ttl: Duration) -> Self {
    Self {
      entries: HashMap::new(),
      ttl,
    }
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  pub fn set_ttl(&mut self, ttl: Duration) {
    self.ttl = ttl;
  }

  pub fn insert(&mut self, key: impl Into<String>, data: T) {
    self.entries.insert(
      key.into(),
      CacheEntry {
        data,
        stored_at: Instant::now(),
      },
    );
  }

  /// Remove the entry for `key`. Returns whether one was present.
  pub fn invalidate(&mut self, key: &str) -> bool {
    self.entries.remove(key).is_some()
  }

  pub fn clear(&mut self) {
    self.entries.clear();
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl<T: Clone> QueryCache<T> {
  /// Look up a fresh entry, dropping it if it has outlived the ttl.
  pub fn get(&mut self, key: &str) -> Option<T> {
    let expired = self.entries.get(key)?.stored_at.elapsed() > self.ttl;
    if expired {
      debug!(key, "evicting expired cache entry");
      self.entries.remove(key);
      return None;
    }
    self.entries.get(key).map(|entry| entry.data.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test(start_paused = true)]
  async fn test_fresh_entry_is_returned() {
    let mut cache = QueryCache::new(Duration::from_millis(1000));
    cache.insert("posts-1", vec![1, 2, 3]);

    tokio::time::advance(Duration::from_millis(999)).await;
    assert_eq!(cache.get("posts-1"), Some(vec![1, 2, 3]));
  }

  #[tokio::test(start_paused = true)]
  async fn test_entry_at_exact_ttl_is_still_fresh() {
    let mut cache = QueryCache::new(Duration::from_millis(1000));
    cache.insert("k", 1);

    tokio::time::advance(Duration::from_millis(1000)).await;
    assert_eq!(cache.get("k"), Some(1));
  }

  #[tokio::test(start_paused = true)]
  async fn test_expired_entry_is_a_miss_and_evicted() {
    let mut cache = QueryCache::new(Duration::from_millis(1000));
    cache.insert("k", 1);

    tokio::time::advance(Duration::from_millis(1001)).await;
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("k"), None);
    assert!(cache.is_empty());
  }

  #[tokio::test]
  async fn test_invalidate() {
    let mut cache = QueryCache::new(Duration::from_secs(60));
    cache.insert("k", "v");

    assert!(cache.invalidate("k"));
    assert!(!cache.invalidate("k"));
    assert_eq!(cache.get("k"), None);
  }

  #[tokio::test]
  async fn test_missing_key() {
    let mut cache: QueryCache<u8> = QueryCache::new(Duration::from_secs(1));
    assert_eq!(cache.get("nothing"), None);
  }
}
