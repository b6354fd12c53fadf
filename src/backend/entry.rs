//! Cache Entry Module
//!
//! Defines the structure for individual backend entries with TTL support.

use chrono::{DateTime, Duration, Utc};

// == Cache Entry ==
/// A single stored value with its expiry metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Expiration timestamp, None = no expiration
    pub expires_at: Option<DateTime<Utc>>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry with an optional TTL in seconds.
    pub fn new(value: V, ttl_seconds: Option<u64>) -> Self {
        let now = Utc::now();
        let expires_at = ttl_seconds.map(|ttl| now + Duration::seconds(ttl as i64));

        Self {
            value,
            created_at: now,
            expires_at,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired once the current time is
    /// greater than or equal to its expiration time.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => Utc::now() >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the remaining TTL in seconds, or None if no expiration is set.
    ///
    /// Returns `Some(0)` once the entry has expired.
    pub fn ttl_remaining(&self) -> Option<u64> {
        self.expires_at.map(|expires| {
            let remaining = (expires - Utc::now()).num_seconds();
            remaining.max(0) as u64
        })
    }
}
