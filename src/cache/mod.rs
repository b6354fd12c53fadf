//! Cache Module
//!
//! Get-or-compute orchestration over a pluggable backend, with single-key and
//! multi-key (fan-out) variants.

mod multi;
mod orchestrator;
mod stats;


// Re-export public types
pub use multi::MultiKeyCache;
pub use orchestrator::{GenericCache, GetOptions, Orchestrator};
pub use stats::CacheStats;
