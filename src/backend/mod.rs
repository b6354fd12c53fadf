//! Backend Module
//!
//! The storage contract behind the orchestrators, plus the bundled in-memory
//! implementation with passive TTL expiry.

mod entry;
mod memory;

// Re-export public types
pub use entry::CacheEntry;
pub use memory::InMemoryBackend;

use crate::error::Result;

// == Backend Trait ==
/// The storage contract implemented by any key-value plug-in.
///
/// Values are opaque to the core. Timeouts have seconds granularity and are
/// applied at set time; `get` on an absent or expired key returns `Ok(None)`,
/// never an error. Backend failures are returned as
/// [`CacheError::Backend`](crate::CacheError::Backend) and propagate through
/// the orchestrators unmodified.
///
/// An instance may be shared across many orchestrators (distinguished by key
/// prefix); supporting concurrent access is the backend's contract, not the
/// orchestration core's.
///
/// # Known limitation
/// The orchestrators treat `Ok(None)` as a miss. A backend that maps a stored
/// "empty" value to `None` makes that value indistinguishable from a true
/// miss, so such values are recomputed on every call. This mirrors backends
/// that cannot represent a present-but-null entry and is deliberate; do not
/// paper over it in an implementation.
pub trait Backend<V>: Send + Sync {
    /// Returns the value stored under `key`, or None when absent or expired.
    fn get(&self, key: &str) -> Result<Option<V>>;

    /// Stores `value` under `key`. `timeout` is seconds until backend-side
    /// expiry; None stores without expiry.
    fn set(&self, key: &str, value: V, timeout: Option<u64>) -> Result<()>;

    /// Removes the entry stored under `key`, if any.
    fn delete(&self, key: &str) -> Result<()>;
}

// == Shared Backend ==
/// A shared backend handle is itself a backend, so one store can sit behind
/// several orchestrators.
impl<V, B> Backend<V> for std::sync::Arc<B>
where
    B: Backend<V> + ?Sized,
{
    fn get(&self, key: &str) -> Result<Option<V>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: V, timeout: Option<u64>) -> Result<()> {
        (**self).set(key, value, timeout)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }
}
