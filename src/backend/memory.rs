//! In-Memory Backend Module
//!
//! HashMap-backed storage with passive TTL expiry checked at read time.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::backend::{Backend, CacheEntry};
use crate::cache::CacheStats;
use crate::error::Result;

// == In-Memory Backend ==
/// The bundled [`Backend`] implementation.
///
/// Entries live in a HashMap behind an `RwLock`, so one instance can be
/// shared across threads and orchestrators. Expiry is passive: an expired
/// entry is removed when a read finds it, and there is no background cleanup
/// or eviction.
#[derive(Debug)]
pub struct InMemoryBackend<V> {
    inner: RwLock<Inner<V>>,
}

impl<V> Default for InMemoryBackend<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct Inner<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Performance statistics
    stats: CacheStats,
}

impl<V> Default for Inner<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
        }
    }
}

impl<V> InMemoryBackend<V> {
    // == Constructor ==
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    // == Stats ==
    /// Returns current backend statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.read().expect("lock poisoned");
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.entries.len());
        stats
    }

    // == Length ==
    /// Returns the current number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.inner.read().expect("lock poisoned").entries.len()
    }

    // == Is Empty ==
    /// Returns true if the backend holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> Backend<V> for InMemoryBackend<V>
where
    V: Clone + Send + Sync,
{
    // == Get ==
    /// Returns the stored value, or None when absent or expired.
    ///
    /// An expired entry is removed on the spot and counted as a miss.
    fn get(&self, key: &str) -> Result<Option<V>> {
        let mut inner = self.inner.write().expect("lock poisoned");

        match inner.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                inner.entries.remove(key);
                let total = inner.entries.len();
                inner.stats.set_total_entries(total);
                inner.stats.record_expiration();
                inner.stats.record_miss();
                Ok(None)
            }
            Some(entry) => {
                let value = entry.value.clone();
                inner.stats.record_hit();
                Ok(Some(value))
            }
            None => {
                inner.stats.record_miss();
                Ok(None)
            }
        }
    }

    // == Set ==
    /// Stores a value, overwriting any previous entry and resetting its TTL.
    fn set(&self, key: &str, value: V, timeout: Option<u64>) -> Result<()> {
        let mut inner = self.inner.write().expect("lock poisoned");
        inner
            .entries
            .insert(key.to_string(), CacheEntry::new(value, timeout));
        let total = inner.entries.len();
        inner.stats.set_total_entries(total);
        Ok(())
    }

    // == Delete ==
    /// Removes an entry. Deleting an absent key is a no-op.
    fn delete(&self, key: &str) -> Result<()> {
        let mut inner = self.inner.write().expect("lock poisoned");
        inner.entries.remove(key);
        let total = inner.entries.len();
        inner.stats.set_total_entries(total);
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_backend_new() {
        let backend: InMemoryBackend<String> = InMemoryBackend::new();
        assert_eq!(backend.len(), 0);
        assert!(backend.is_empty());
    }

    #[test]
    fn test_backend_set_and_get() {
        let backend = InMemoryBackend::new();

        backend.set("key1", "value1".to_string(), None).unwrap();
        let value = backend.get("key1").unwrap();

        assert_eq!(value, Some("value1".to_string()));
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn test_backend_get_absent() {
        let backend: InMemoryBackend<String> = InMemoryBackend::new();
        assert_eq!(backend.get("nonexistent").unwrap(), None);
    }

    #[test]
    fn test_backend_overwrite_resets_value() {
        let backend = InMemoryBackend::new();

        backend.set("key1", "value1".to_string(), None).unwrap();
        backend.set("key1", "value2".to_string(), None).unwrap();

        assert_eq!(backend.get("key1").unwrap(), Some("value2".to_string()));
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn test_backend_delete() {
        let backend = InMemoryBackend::new();

        backend.set("key1", "value1".to_string(), None).unwrap();
        backend.delete("key1").unwrap();

        assert!(backend.is_empty());
        assert_eq!(backend.get("key1").unwrap(), None);
    }

    #[test]
    fn test_backend_delete_absent_is_noop() {
        let backend: InMemoryBackend<String> = InMemoryBackend::new();
        backend.delete("nonexistent").unwrap();
    }

    #[test]
    fn test_backend_ttl_expiration() {
        let backend = InMemoryBackend::new();

        backend.set("key1", "value1".to_string(), Some(1)).unwrap();
        assert!(backend.get("key1").unwrap().is_some());

        sleep(Duration::from_millis(1100));

        // Expired entry reads as absent and is removed
        assert_eq!(backend.get("key1").unwrap(), None);
        assert!(backend.is_empty());
    }

    #[test]
    fn test_backend_no_ttl_never_expires() {
        let backend = InMemoryBackend::new();

        backend.set("key1", "value1".to_string(), None).unwrap();
        sleep(Duration::from_millis(50));
        assert!(backend.get("key1").unwrap().is_some());
    }

    #[test]
    fn test_backend_stats() {
        let backend = InMemoryBackend::new();

        backend.set("key1", "value1".to_string(), None).unwrap();
        backend.get("key1").unwrap(); // hit
        backend.get("nonexistent").unwrap(); // miss

        let stats = backend.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_backend_expiration_counts_as_miss() {
        let backend = InMemoryBackend::new();

        backend.set("key1", "value1".to_string(), Some(1)).unwrap();
        sleep(Duration::from_millis(1100));
        backend.get("key1").unwrap();

        let stats = backend.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_backend_shared_across_threads() {
        use std::sync::Arc;

        let backend = Arc::new(InMemoryBackend::new());
        let mut handles = Vec::new();

        for i in 0..4 {
            let backend = Arc::clone(&backend);
            handles.push(std::thread::spawn(move || {
                let key = format!("key{}", i);
                backend.set(&key, i, None).unwrap();
                assert_eq!(backend.get(&key).unwrap(), Some(i));
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(backend.len(), 4);
    }
}
