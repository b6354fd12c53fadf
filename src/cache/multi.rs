//! Multi-Key Cache Module
//!
//! Fan-out orchestration: one computed value stored under several derived
//! keys, invalidated together.

use crate::backend::Backend;
use crate::cache::{GenericCache, Orchestrator};
use crate::error::Result;
use crate::key::CacheKey;

/// Hook deriving the dependent keys of a value from its primary key.
type FanoutFn<V> = Box<dyn Fn(&CacheKey, &V) -> Vec<CacheKey> + Send + Sync>;

// == Multi-Key Cache ==
/// An [`Orchestrator`] that writes one value under several keys.
///
/// The fan-out hook derives dependent keys from the computed value, e.g.
/// caching the same record under an id key and a name key. Each key carries
/// its own timeout. Writes and joint invalidation walk the keys in order,
/// primary first, and stop at the first backend failure; a partial write or
/// flush is possible and no rollback is attempted.
pub struct MultiKeyCache<B, V> {
    inner: GenericCache<B, V>,
    fanout: FanoutFn<V>,
}

impl<B, V> MultiKeyCache<B, V>
where
    B: Backend<V>,
    V: Clone,
{
    // == Constructor ==
    /// Creates a multi-key orchestrator with an empty fan-out hook, behaving
    /// exactly like the wrapped single-key orchestrator until a hook is set.
    pub fn new(inner: GenericCache<B, V>) -> Self {
        Self {
            inner,
            fanout: Box::new(|_, _| Vec::new()),
        }
    }

    // == Fanout Setter ==
    /// Sets the hook deriving dependent keys from a primary key and value.
    pub fn with_fanout<F>(mut self, fanout: F) -> Self
    where
        F: Fn(&CacheKey, &V) -> Vec<CacheKey> + Send + Sync + 'static,
    {
        self.fanout = Box::new(fanout);
        self
    }

    // == Other Keys ==
    /// The dependent keys derived for `value`, in hook order.
    pub fn other_keys(&self, key: &CacheKey, value: &V) -> Vec<CacheKey> {
        (self.fanout)(key, value)
    }

    // == All Keys ==
    /// Every key the value lives under: the primary key first, then the
    /// derived keys in hook order.
    pub fn all_keys(&self, key: &CacheKey, value: &V) -> impl Iterator<Item = CacheKey> {
        std::iter::once(key.clone()).chain(self.other_keys(key, value))
    }

    // == Flush All ==
    /// Jointly invalidates the primary key and every derived key.
    ///
    /// The derived keys can only be computed from the cached value, so when
    /// the primary key is absent this is a no-op (zero deletes). Deletes run
    /// in order and stop at the first backend failure.
    pub fn flush_all(&self, key: &CacheKey) -> Result<()> {
        match self.inner.get_cached(key)? {
            None => Ok(()),
            Some(value) => {
                for derived in self.all_keys(key, &value) {
                    self.inner.flush(&derived)?;
                }
                Ok(())
            }
        }
    }

    // == Backend Accessor ==
    /// The backend behind this orchestrator.
    pub fn backend(&self) -> &B {
        self.inner.backend()
    }
}

impl<B, V> Orchestrator<V> for MultiKeyCache<B, V>
where
    B: Backend<V>,
    V: Clone,
{
    fn get_cached(&self, key: &CacheKey) -> Result<Option<V>> {
        self.inner.get_cached(key)
    }

    // == Set ==
    /// Writes `value` under every key, each with its own timeout, primary
    /// first. Sequential fail-fast: a backend failure stops the walk.
    fn set(&self, key: &CacheKey, value: &V) -> Result<()> {
        for derived in self.all_keys(key, value) {
            self.inner.set(&derived, value)?;
        }
        Ok(())
    }

    fn flush(&self, key: &CacheKey) -> Result<()> {
        self.inner.flush(key)
    }

    fn key_prefix(&self) -> &str {
        self.inner.key_prefix()
    }

    fn default_timeout(&self) -> Option<u64> {
        Orchestrator::<V>::default_timeout(&self.inner)
    }

    fn logging_enabled(&self) -> bool {
        Orchestrator::<V>::logging_enabled(&self.inner)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::cache::GetOptions;
    use crate::error::CacheError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Backend wrapper that counts deletes and can be switched to fail.
    #[derive(Default)]
    struct RecordingBackend {
        store: InMemoryBackend<String>,
        deletes: AtomicUsize,
        sets: AtomicUsize,
        fail_after_sets: Option<usize>,
    }

    impl Backend<String> for RecordingBackend {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.store.get(key)
        }

        fn set(&self, key: &str, value: String, timeout: Option<u64>) -> Result<()> {
            if let Some(limit) = self.fail_after_sets {
                if self.sets.load(Ordering::SeqCst) >= limit {
                    return Err(CacheError::backend(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        "backend down",
                    )));
                }
            }
            self.sets.fetch_add(1, Ordering::SeqCst);
            self.store.set(key, value, timeout)
        }

        fn delete(&self, key: &str) -> Result<()> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.store.delete(key)
        }
    }

    fn id_and_name_cache(
        backend: Arc<RecordingBackend>,
    ) -> MultiKeyCache<Arc<RecordingBackend>, String> {
        // Cache a record under its id key and a derived name key.
        MultiKeyCache::new(GenericCache::new(backend)).with_fanout(|key, value| {
            vec![CacheKey::new(format!("{}.by_name.{}", key.key_type(), value)).with_timeout(10)]
        })
    }

    #[test]
    fn test_all_keys_yields_primary_first() {
        let cache = id_and_name_cache(Arc::new(RecordingBackend::default()));
        let key = CacheKey::new("user").with_timeout(30);
        let keys: Vec<String> = cache
            .all_keys(&key, &"alice".to_string())
            .map(|k| k.key_str().to_string())
            .collect();
        assert_eq!(keys, vec!["user", "user.by_name.alice"]);
    }

    #[test]
    fn test_set_writes_every_key_with_own_timeout() {
        let backend = Arc::new(RecordingBackend::default());
        let cache = id_and_name_cache(Arc::clone(&backend));
        let key = CacheKey::new("user").with_timeout(30);

        cache.set(&key, &"alice".to_string()).unwrap();

        assert_eq!(backend.sets.load(Ordering::SeqCst), 2);
        assert_eq!(backend.get("user").unwrap(), Some("alice".to_string()));
        assert_eq!(
            backend.get("user.by_name.alice").unwrap(),
            Some("alice".to_string())
        );
    }

    #[test]
    fn test_miss_path_fans_out_through_dynamic_dispatch() {
        let backend = Arc::new(RecordingBackend::default());
        let cache = id_and_name_cache(Arc::clone(&backend));
        let key = CacheKey::new("user").with_timeout(30);

        let value = cache
            .get(&key, &mut || "alice".to_string(), GetOptions::default())
            .unwrap();

        assert_eq!(value, "alice");
        assert!(backend.get("user.by_name.alice").unwrap().is_some());
    }

    #[test]
    fn test_flush_all_absent_primary_is_noop() {
        let backend = Arc::new(RecordingBackend::default());
        let cache = id_and_name_cache(Arc::clone(&backend));
        let key = CacheKey::new("user");

        cache.flush_all(&key).unwrap();

        assert_eq!(backend.deletes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_flush_all_deletes_primary_and_derived() {
        let backend = Arc::new(RecordingBackend::default());
        let cache = id_and_name_cache(Arc::clone(&backend));
        let key = CacheKey::new("user").with_timeout(30);
        cache.set(&key, &"alice".to_string()).unwrap();

        cache.flush_all(&key).unwrap();

        assert_eq!(backend.deletes.load(Ordering::SeqCst), 2);
        assert_eq!(backend.get("user").unwrap(), None);
        assert_eq!(backend.get("user.by_name.alice").unwrap(), None);
    }

    #[test]
    fn test_set_is_sequential_fail_fast() {
        let backend = Arc::new(RecordingBackend {
            fail_after_sets: Some(1),
            ..Default::default()
        });
        let cache = id_and_name_cache(Arc::clone(&backend));
        let key = CacheKey::new("user").with_timeout(30);

        let result = cache.set(&key, &"alice".to_string());

        // Primary written, derived write failed, nothing rolled back
        assert!(matches!(result, Err(CacheError::Backend(_))));
        assert_eq!(backend.get("user").unwrap(), Some("alice".to_string()));
        assert_eq!(backend.get("user.by_name.alice").unwrap(), None);
    }

    #[test]
    fn test_empty_fanout_behaves_like_single_key() {
        let backend = Arc::new(RecordingBackend::default());
        let cache: MultiKeyCache<_, String> =
            MultiKeyCache::new(GenericCache::new(Arc::clone(&backend)));
        let key = CacheKey::new("solo");

        cache.set(&key, &"value".to_string()).unwrap();
        assert_eq!(backend.sets.load(Ordering::SeqCst), 1);

        cache.flush_all(&key).unwrap();
        assert_eq!(backend.deletes.load(Ordering::SeqCst), 1);
    }
}
