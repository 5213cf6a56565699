//! Background Tasks Module
//!
//! Contains background tasks owned by cache instances.
//!
//! # Tasks
//! - TTL Sweep: Removes expired entries at the cache's configured interval

mod sweep;

pub use sweep::{spawn_sweep_task, SweepOutcome, SweepTarget};
