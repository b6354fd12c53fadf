//! Error types for the memoization layer
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the memoization layer.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A callable signature cannot be normalized into key material
    /// (variadic parameters, arity mismatch, wrong builder for the shape)
    #[error("Unsupported signature: {0}")]
    Signature(String),

    /// A call-site cache binding does not resolve to an orchestrator
    #[error("Invalid cache binding: {0}")]
    Configuration(String),

    /// A storage backend failure, propagated unmodified
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

impl CacheError {
    // == Backend Constructor ==
    /// Wraps an arbitrary backend failure for transparent propagation.
    ///
    /// The core never retries or suppresses backend errors; this constructor
    /// only erases the concrete error type so it can cross the trait boundary.
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CacheError::Backend(Box::new(err))
    }
}

// == Result Type Alias ==
/// Convenience Result type for the memoization layer.
pub type Result<T> = std::result::Result<T, CacheError>;

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_error_message() {
        let err = CacheError::Signature("variadic parameters".to_string());
        assert_eq!(err.to_string(), "Unsupported signature: variadic parameters");
    }

    #[test]
    fn test_configuration_error_message() {
        let err = CacheError::Configuration("'users' is not registered".to_string());
        assert_eq!(err.to_string(), "Invalid cache binding: 'users' is not registered");
    }

    #[test]
    fn test_backend_error_is_transparent() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "connection reset");
        let err = CacheError::backend(io);
        assert_eq!(err.to_string(), "connection reset");
    }
}
