//! Cache Key Module
//!
//! Defines the canonical cache key: a logical identity (type + version +
//! ordered args + sorted kwargs) rendered lazily to a stable string.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use crate::key::{KeyPart, KEY_SEPARATOR, RESERVED_KEY_VERSION, RESERVED_TIMEOUT};

// == Cache Key ==
/// A logical cache identity with a lazily memoized string form.
///
/// The rendered string is `<type><version>`, followed by each positional arg
/// in original order, followed by each kwarg as `<name>_<value>` in ascending
/// name order, all joined with `__`. Sections are only emitted when non-empty,
/// so the format is byte-for-byte:
/// `<type><version>[__<arg>]*[__<name>_<value>]*`
///
/// A key is built fresh for every call-site invocation and never outlives one
/// get/set/flush operation. Identity is purely by string value.
///
/// # Mutation hazard
/// The string form is rendered on the first [`CacheKey::key_str`] read and
/// never recomputed. [`CacheKey::set_timeout`] is the one sanctioned mutation
/// and must happen before that first read; mutating a key after its string has
/// materialized silently desynchronizes the string from the fields. This is a
/// caller error that the type does not detect, kept for compatibility with
/// entries written by earlier integrations.
#[derive(Debug, Clone)]
pub struct CacheKey {
    key_type: String,
    version: String,
    timeout: Option<u64>,
    args: Vec<KeyPart>,
    kwargs: BTreeMap<String, KeyPart>,
    rendered: OnceLock<String>,
}

impl CacheKey {
    // == Constructor ==
    /// Creates a key with no args, no kwargs, empty version and no timeout.
    pub fn new(key_type: impl Into<String>) -> Self {
        Self {
            key_type: key_type.into(),
            version: String::new(),
            timeout: None,
            args: Vec::new(),
            kwargs: BTreeMap::new(),
            rendered: OnceLock::new(),
        }
    }

    // == Args Constructor ==
    /// Creates a key from positional args and keyword args.
    ///
    /// The reserved kwargs `timeout` (seconds) and `key_version` are popped
    /// out of the map before it becomes key material.
    pub fn from_args(
        key_type: impl Into<String>,
        args: Vec<KeyPart>,
        mut kwargs: BTreeMap<String, KeyPart>,
    ) -> Self {
        let timeout = kwargs
            .remove(RESERVED_TIMEOUT)
            .and_then(|p| p.as_int())
            .and_then(|t| u64::try_from(t).ok());
        let version = kwargs
            .remove(RESERVED_KEY_VERSION)
            .map(|p| p.to_string())
            .unwrap_or_default();

        Self {
            key_type: key_type.into(),
            version,
            timeout,
            args,
            kwargs,
            rendered: OnceLock::new(),
        }
    }

    // == Builder Setters ==
    /// Sets the manual cache-busting tag appended to the key type.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    // == Set Timeout ==
    /// Injects a default or call-site timeout override.
    ///
    /// This is the mutation path used by orchestrators and wrappers. It must
    /// run before the first [`CacheKey::key_str`] read; see the type-level
    /// mutation hazard.
    pub fn set_timeout(&mut self, timeout: Option<u64>) {
        self.timeout = timeout;
    }

    // == Accessors ==
    /// The logical operation name this key belongs to.
    pub fn key_type(&self) -> &str {
        &self.key_type
    }

    /// The manual cache-busting tag, empty when unset.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Timeout in seconds, None = no expiry.
    pub fn timeout(&self) -> Option<u64> {
        self.timeout
    }

    /// Positional args in original order.
    pub fn args(&self) -> &[KeyPart] {
        &self.args
    }

    /// Keyword args, sorted by name.
    pub fn kwargs(&self) -> &BTreeMap<String, KeyPart> {
        &self.kwargs
    }

    // == Key String ==
    /// Returns the canonical string form, rendering it on first read.
    ///
    /// Repeated reads return the identical string; the render is never redone.
    pub fn key_str(&self) -> &str {
        self.rendered.get_or_init(|| self.render())
    }

    fn render(&self) -> String {
        let mut out = format!("{}{}", self.key_type, self.version);
        if !self.args.is_empty() {
            let args_str = self
                .args
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join(KEY_SEPARATOR);
            out.push_str(KEY_SEPARATOR);
            out.push_str(&args_str);
        }
        if !self.kwargs.is_empty() {
            let kwargs_str = self
                .kwargs
                .iter()
                .map(|(k, v)| format!("{}_{}", k, v))
                .collect::<Vec<_>>()
                .join(KEY_SEPARATOR);
            out.push_str(KEY_SEPARATOR);
            out.push_str(&kwargs_str);
        }
        out
    }
}

// == Display Implementation ==
impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_str())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn kwargs(pairs: &[(&str, KeyPart)]) -> BTreeMap<String, KeyPart> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_plain_key_is_type_plus_version() {
        let key = CacheKey::new("mykey").with_timeout(5).with_version("v1");
        assert_eq!(key.timeout(), Some(5));
        assert_eq!(key.version(), "v1");
        assert_eq!(key.key_type(), "mykey");
        assert_eq!(key.key_str(), "mykeyv1");
        assert_eq!(key.to_string(), "mykeyv1");
    }

    #[test]
    fn test_args_and_sorted_kwargs() {
        let key = CacheKey::from_args(
            "type",
            vec![1.into(), 2.into(), 3.into()],
            kwargs(&[("other", "some".into()), ("some", "other".into())]),
        );
        assert_eq!(key.key_str(), "type__1__2__3__other_some__some_other");
    }

    #[test]
    fn test_version_sits_between_type_and_args() {
        let key = CacheKey::from_args(
            "type",
            vec![1.into(), 2.into(), 3.into()],
            kwargs(&[
                ("some", "other".into()),
                ("other", "some".into()),
                ("key_version", "v2".into()),
            ]),
        );
        assert_eq!(key.version(), "v2");
        assert_eq!(key.key_str(), "typev2__1__2__3__other_some__some_other");
    }

    #[test]
    fn test_reserved_kwargs_are_popped() {
        let key = CacheKey::from_args(
            "type",
            vec![],
            kwargs(&[("timeout", 30.into()), ("a", 1.into())]),
        );
        assert_eq!(key.timeout(), Some(30));
        assert_eq!(key.key_str(), "type__a_1");
    }

    #[test]
    fn test_args_only() {
        let key = CacheKey::from_args("t", vec!["x".into()], BTreeMap::new());
        assert_eq!(key.key_str(), "t__x");
    }

    #[test]
    fn test_kwargs_only() {
        let key = CacheKey::from_args("t", vec![], kwargs(&[("a", 1.into())]));
        assert_eq!(key.key_str(), "t__a_1");
    }

    #[test]
    fn test_key_str_is_idempotent() {
        let key = CacheKey::from_args(
            "t",
            vec![7.into()],
            kwargs(&[("b", 2.into()), ("a", 1.into())]),
        );
        let first = key.key_str().to_string();
        assert_eq!(key.key_str(), first);
        assert_eq!(key.key_str(), first);
    }

    #[test]
    fn test_mutation_after_materialization_is_not_reflected() {
        // The documented hazard: the rendered string is frozen on first read.
        let mut key = CacheKey::new("t").with_timeout(1);
        assert_eq!(key.key_str(), "t");
        key.set_timeout(Some(99));
        assert_eq!(key.timeout(), Some(99));
        assert_eq!(key.key_str(), "t");
    }

    #[test]
    fn test_set_timeout_before_first_read() {
        let mut key = CacheKey::new("t");
        key.set_timeout(Some(10));
        assert_eq!(key.timeout(), Some(10));
        assert_eq!(key.key_str(), "t");
    }
}
