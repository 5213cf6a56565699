//! Remote Module
//!
//! Network-backed caching: the [`RemoteStore`] protocol, its HTTP and
//! in-process implementations, and the namespaced [`RemoteCache`] front.

mod cache;
mod http;
mod memory;
mod store;

pub use cache::RemoteCache;
pub use http::HttpStore;
pub use memory::MemoryStore;
pub use store::{ttl_secs_to_ms, RemoteStore};
