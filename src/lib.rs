//! Memocache - A generic memoization layer
//!
//! Wraps arbitrary computations so their results are stored in a pluggable
//! key-value backend and reused across calls, keyed by a deterministic string
//! derived from the call's logical arguments.
//!
//! Keys render as `<type><version>[__<arg>]*[__<name>_<value>]*` with kwargs
//! sorted by name, so entries written by earlier integrations stay readable.
//!
//! Known limitation: a backend that cannot represent a present-but-empty
//! value makes such values indistinguishable from a miss, and they are
//! recomputed on every call. See [`backend::Backend`].

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod key;
pub mod wrapper;

pub use backend::{Backend, InMemoryBackend};
pub use cache::{CacheStats, GenericCache, GetOptions, MultiKeyCache, Orchestrator};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use key::{
    AttrSource, AttrsMethodKeyBuilder, CacheKey, CallArgs, FunctionKeyBuilder, KeyBuilder,
    KeyPart, MethodKeyBuilder, Signature,
};
pub use wrapper::{CacheRegistry, CachedFn};
