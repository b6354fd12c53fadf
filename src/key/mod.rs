//! Key Module
//!
//! Canonical cache keys and the builders that derive them from call arguments.

mod builder;
mod cache_key;
mod part;

// Re-export public types
pub use builder::{
    AttrSource, AttrsMethodKeyBuilder, CallArgs, FunctionKeyBuilder, KeyBuilder,
    MethodKeyBuilder, Signature,
};
pub use cache_key::CacheKey;
pub use part::KeyPart;

// == Public Constants ==
/// Separator between sections of a rendered key string
pub const KEY_SEPARATOR: &str = "__";

/// Reserved kwarg consumed at key construction: timeout override in seconds
pub const RESERVED_TIMEOUT: &str = "timeout";

/// Reserved kwarg consumed at key construction: manual cache-busting tag
pub const RESERVED_KEY_VERSION: &str = "key_version";

/// Reserved invocation kwarg: bypass the backend lookup for one call
pub const RESERVED_DISABLE_CACHE: &str = "disable_cache";

/// Reserved invocation kwarg: skip the write-back after a computed value
pub const RESERVED_DISABLE_CACHE_OVERWRITE: &str = "disable_cache_overwrite";
