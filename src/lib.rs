//! Evicting Cache - in-process TTL and LRU containers
//!
//! Provides an expiring cache with lazy and background expiry, a bounded
//! least-recently-used cache, and a namespaced network-backed cache with the
//! store server it talks to.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod remote;
pub mod tasks;

pub use api::AppState;
pub use cache::{BoundedRecencyCache, CacheStats, Clock, ExpiringCache, ManualClock, SystemClock};
pub use config::Config;
pub use remote::{HttpStore, MemoryStore, RemoteCache, RemoteStore};
