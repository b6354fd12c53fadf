//! Orchestrator Module
//!
//! Coordinates key derivation, backend calls and the compute-on-miss
//! fallback; implements the hit/miss/disable/overwrite policy.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use tracing::debug;

use crate::backend::Backend;
use crate::config::CacheConfig;
use crate::error::Result;
use crate::key::{CacheKey, KeyPart};

// == Get Options ==
/// Per-call cache control flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetOptions {
    /// Skip the backend lookup and always recompute
    pub disable_cache: bool,
    /// Skip the write-back after a computed value
    pub disable_overwrite: bool,
}

// == Orchestrator Trait ==
/// Get-or-compute orchestration over a backend.
///
/// Object-safe so wrappers and registries can hold single-key and multi-key
/// orchestrators uniformly. The provided [`Orchestrator::get`] dispatches
/// `set` dynamically, so a multi-key implementation fans out on the miss path
/// without reimplementing the policy.
pub trait Orchestrator<V: Clone>: Send + Sync {
    /// Raw backend read by the key's rendered string. `Ok(None)` means
    /// absent or expired.
    fn get_cached(&self, key: &CacheKey) -> Result<Option<V>>;

    /// Writes through to the backend using the key's own timeout.
    fn set(&self, key: &CacheKey, value: &V) -> Result<()>;

    /// Deletes the key's entry from the backend.
    fn flush(&self, key: &CacheKey) -> Result<()>;

    /// Prefix prepended to every derived key.
    fn key_prefix(&self) -> &str;

    /// Timeout applied to derived keys without an explicit override.
    fn default_timeout(&self) -> Option<u64>;

    /// Whether hit/miss/set/flush debug events are emitted.
    fn logging_enabled(&self) -> bool;

    // == Derive Key ==
    /// Builds a key from a type label plus args and kwargs, applying the
    /// orchestrator's prefix. A reserved `timeout` kwarg overrides the
    /// default timeout; `key_version` becomes the key's version tag.
    fn derive_key(
        &self,
        key_type: &str,
        args: Vec<KeyPart>,
        kwargs: BTreeMap<String, KeyPart>,
    ) -> CacheKey {
        let full_type = format!("{}{}", self.key_prefix(), key_type);
        let mut key = CacheKey::from_args(full_type, args, kwargs);
        if key.timeout().is_none() {
            key.set_timeout(self.default_timeout());
        }
        key
    }

    // == Get ==
    /// Gets the value for `key`, computing it on a miss.
    ///
    /// Unless `opts.disable_cache`, the backend is queried first and a
    /// present value is returned as-is; `compute` only runs when the backend
    /// reported absent (or the lookup was disabled). Unless
    /// `opts.disable_overwrite`, a computed value is written back before it
    /// is returned.
    ///
    /// There is no locking around the lookup-then-write window: concurrent
    /// misses on the same key each compute and each write, last writer wins.
    fn get(&self, key: &CacheKey, compute: &mut dyn FnMut() -> V, opts: GetOptions) -> Result<V> {
        if !opts.disable_cache {
            if let Some(value) = self.get_cached(key)? {
                if self.logging_enabled() {
                    debug!(key = key.key_str(), "cache hit");
                }
                return Ok(value);
            }
            if self.logging_enabled() {
                debug!(key = key.key_str(), "cache miss");
            }
        }

        let value = compute();
        if !opts.disable_overwrite {
            self.set(key, &value)?;
        }
        Ok(value)
    }
}

// == Generic Cache ==
/// The single-key [`Orchestrator`]: one value under one key.
///
/// Holds the backend by value; share a backend between orchestrators by
/// using an `Arc<_>` as the backend type and distinguishing instances by key
/// prefix.
#[derive(Debug)]
pub struct GenericCache<B, V> {
    backend: B,
    default_timeout: Option<u64>,
    key_prefix: String,
    logging: bool,
    _value: PhantomData<fn() -> V>,
}

impl<B, V> GenericCache<B, V> {
    // == Constructor ==
    /// Creates an orchestrator with no prefix, no default timeout and
    /// logging disabled.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            default_timeout: None,
            key_prefix: String::new(),
            logging: false,
            _value: PhantomData,
        }
    }

    // == Config Constructor ==
    /// Creates an orchestrator from a [`CacheConfig`].
    pub fn with_config(backend: B, config: &CacheConfig) -> Self {
        Self {
            backend,
            default_timeout: config.default_timeout,
            key_prefix: config.key_prefix.clone(),
            logging: config.logging,
            _value: PhantomData,
        }
    }

    // == Builder Setters ==
    /// Sets the prefix prepended to every derived key.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Sets the default timeout in seconds for derived keys.
    pub fn with_default_timeout(mut self, timeout: u64) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Enables hit/miss/set/flush debug events.
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.logging = enabled;
        self
    }

    // == Backend Accessor ==
    /// The backend behind this orchestrator.
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B, V> Orchestrator<V> for GenericCache<B, V>
where
    B: Backend<V>,
    V: Clone,
{
    fn get_cached(&self, key: &CacheKey) -> Result<Option<V>> {
        self.backend.get(key.key_str())
    }

    fn set(&self, key: &CacheKey, value: &V) -> Result<()> {
        if self.logging {
            debug!(key = key.key_str(), timeout = ?key.timeout(), "cache set");
        }
        self.backend.set(key.key_str(), value.clone(), key.timeout())
    }

    fn flush(&self, key: &CacheKey) -> Result<()> {
        if self.logging {
            debug!(key = key.key_str(), "cache flush");
        }
        self.backend.delete(key.key_str())
    }

    fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    fn default_timeout(&self) -> Option<u64> {
        self.default_timeout
    }

    fn logging_enabled(&self) -> bool {
        self.logging
    }
}
