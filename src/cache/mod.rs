//! Cache Module
//!
//! In-memory containers with TTL expiration and LRU eviction.

mod clock;
mod expiring;
mod recency;
mod stats;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use expiring::ExpiringCache;
pub use recency::BoundedRecencyCache;
pub use stats::CacheStats;

// == Public Constants ==
/// Capacity used by [`BoundedRecencyCache::default`]
pub const DEFAULT_CAPACITY: usize = 100;

/// TTL that never elapses in practice
pub const NO_EXPIRY_MS: i64 = i64::MAX;

/// Maximum allowed key length in bytes for the store server
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes for the store server
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
