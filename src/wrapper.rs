//! Call Wrapper Module
//!
//! Binds a target callable to an orchestrator, a key builder and a key-type
//! label, producing a cached callable with explicit `call` / `peek` /
//! `invalidate` operations.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::cache::{GetOptions, Orchestrator};
use crate::error::{CacheError, Result};
use crate::key::{
    AttrSource, CacheKey, CallArgs, KeyBuilder, Signature, RESERVED_DISABLE_CACHE,
    RESERVED_DISABLE_CACHE_OVERWRITE,
};

// == Cache Registry ==
/// Named orchestrator bindings.
///
/// Call sites that refer to their orchestrator by name resolve it here at
/// call time; a name with no registered orchestrator is a fatal setup error.
pub struct CacheRegistry<V> {
    entries: RwLock<HashMap<String, Arc<dyn Orchestrator<V>>>>,
}

impl<V> Default for CacheRegistry<V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<V: Clone> CacheRegistry<V> {
    // == Constructor ==
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    // == Register ==
    /// Binds an orchestrator under a name, replacing any previous binding.
    pub fn register(&self, name: impl Into<String>, orchestrator: Arc<dyn Orchestrator<V>>) {
        self.entries
            .write()
            .expect("lock poisoned")
            .insert(name.into(), orchestrator);
    }

    // == Resolve ==
    /// Looks up the orchestrator bound under `name`.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Orchestrator<V>>> {
        self.entries
            .read()
            .expect("lock poisoned")
            .get(name)
            .cloned()
            .ok_or_else(|| {
                CacheError::Configuration(format!(
                    "'{}' does not resolve to a cache orchestrator",
                    name
                ))
            })
    }
}

// == Orchestrator Binding ==
/// How a wrapper reaches its orchestrator: a direct reference, or a named
/// registry binding resolved at every call.
enum Binding<V> {
    Direct(Arc<dyn Orchestrator<V>>),
    Named {
        registry: Arc<CacheRegistry<V>>,
        name: String,
    },
}

impl<V: Clone> Binding<V> {
    fn resolve(&self) -> Result<Arc<dyn Orchestrator<V>>> {
        match self {
            Binding::Direct(orchestrator) => Ok(Arc::clone(orchestrator)),
            Binding::Named { registry, name } => registry.resolve(name),
        }
    }
}

// == Cached Fn ==
/// A cached callable.
///
/// Wraps a target computation together with the declared [`Signature`], a
/// [`KeyBuilder`], an orchestrator binding, a key-type label and an optional
/// fixed version and timeout. The reserved invocation kwargs `disable_cache`
/// and `disable_cache_overwrite` are popped before the target or the key ever
/// see the arguments.
///
/// `call`, `peek` and `invalidate` derive the identical key string for the
/// same logical arguments, regardless of how the caller splits them between
/// positional and keyword form.
pub struct CachedFn<V> {
    target: Box<dyn Fn(&CallArgs) -> V + Send + Sync>,
    signature: Signature,
    key_builder: Box<dyn KeyBuilder>,
    binding: Binding<V>,
    key_type: String,
    version: String,
    timeout: Option<u64>,
    receiver: Option<Arc<dyn AttrSource + Send + Sync>>,
}

impl<V: Clone> CachedFn<V> {
    // == Constructor ==
    /// Wraps `target` with a directly referenced orchestrator.
    pub fn new<F>(
        key_type: impl Into<String>,
        signature: Signature,
        key_builder: impl KeyBuilder + 'static,
        orchestrator: Arc<dyn Orchestrator<V>>,
        target: F,
    ) -> Self
    where
        F: Fn(&CallArgs) -> V + Send + Sync + 'static,
    {
        Self {
            target: Box::new(target),
            signature,
            key_builder: Box::new(key_builder),
            binding: Binding::Direct(orchestrator),
            key_type: key_type.into(),
            version: String::new(),
            timeout: None,
            receiver: None,
        }
    }

    // == Bound Constructor ==
    /// Wraps `target` with a named registry binding, resolved at every call.
    pub fn bound<F>(
        key_type: impl Into<String>,
        signature: Signature,
        key_builder: impl KeyBuilder + 'static,
        registry: Arc<CacheRegistry<V>>,
        binding: impl Into<String>,
        target: F,
    ) -> Self
    where
        F: Fn(&CallArgs) -> V + Send + Sync + 'static,
    {
        Self {
            target: Box::new(target),
            signature,
            key_builder: Box::new(key_builder),
            binding: Binding::Named {
                registry,
                name: binding.into(),
            },
            key_type: key_type.into(),
            version: String::new(),
            timeout: None,
            receiver: None,
        }
    }

    // == Builder Setters ==
    /// Sets a fixed cache-busting version appended to every derived key.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Sets a per-definition timeout override, taking precedence over the
    /// orchestrator's default.
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Binds the receiver whose attributes participate in key material.
    pub fn with_receiver(mut self, receiver: Arc<dyn AttrSource + Send + Sync>) -> Self {
        self.receiver = Some(receiver);
        self
    }

    // == Build Key ==
    /// Derives the cache key for one invocation: orchestrator prefix plus
    /// key type, normalized kwargs, fixed version, and the effective timeout
    /// (per-definition override, else orchestrator default) applied before
    /// the key string is rendered.
    fn build_key(&self, orchestrator: &dyn Orchestrator<V>, args: &CallArgs) -> Result<CacheKey> {
        let prefix = format!("{}{}", orchestrator.key_prefix(), self.key_type);
        let receiver = self
            .receiver
            .as_deref()
            .map(|r| r as &dyn AttrSource);
        let kwargs = self
            .key_builder
            .normalized(&self.signature, args, receiver)?;
        let mut key =
            CacheKey::from_args(prefix, Vec::new(), kwargs).with_version(self.version.clone());
        key.set_timeout(self.timeout.or(orchestrator.default_timeout()));
        Ok(key)
    }

    // == Call ==
    /// Invokes the cached callable.
    ///
    /// Pops the reserved `disable_cache` / `disable_cache_overwrite` kwargs,
    /// derives the key from the remaining arguments and delegates to the
    /// orchestrator's get-or-compute with the target as the fallback.
    pub fn call(&self, mut args: CallArgs) -> Result<V> {
        let opts = GetOptions {
            disable_cache: args.pop_flag(RESERVED_DISABLE_CACHE),
            disable_overwrite: args.pop_flag(RESERVED_DISABLE_CACHE_OVERWRITE),
        };

        let orchestrator = self.binding.resolve()?;
        let key = self.build_key(orchestrator.as_ref(), &args)?;
        orchestrator.get(&key, &mut || (self.target)(&args), opts)
    }

    // == Peek ==
    /// Reads the cached value for these arguments without computing.
    pub fn peek(&self, args: CallArgs) -> Result<Option<V>> {
        let orchestrator = self.binding.resolve()?;
        let key = self.build_key(orchestrator.as_ref(), &args)?;
        orchestrator.get_cached(&key)
    }

    // == Invalidate ==
    /// Flushes the cached value for these arguments.
    pub fn invalidate(&self, args: CallArgs) -> Result<()> {
        let orchestrator = self.binding.resolve()?;
        let key = self.build_key(orchestrator.as_ref(), &args)?;
        orchestrator.flush(&key)
    }
}
