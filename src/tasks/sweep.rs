//! TTL Sweep Task
//!
//! Background task that periodically removes expired entries from an
//! [`ExpiringCache`](crate::cache::ExpiringCache) and stops itself once the
//! cache has nothing left to track.

use std::sync::Weak;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info};

// == Sweep Outcome ==
/// Result of one sweep pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// Expired entries were removed and live entries remain.
    Swept { removed: usize },
    /// The last tracked entry is gone; the task must stop.
    Drained { removed: usize },
    /// The task is no longer the cache's registered sweeper.
    Superseded,
}

// == Sweep Target ==
/// Something a sweep task can periodically purge.
pub trait SweepTarget: Send + Sync + 'static {
    /// Removes expired entries on behalf of the sweeper registered as `epoch`.
    fn sweep_expired(&self, epoch: u64) -> SweepOutcome;
}

/// Spawns the periodic sweep for `target`.
///
/// The task holds only a weak reference, so dropping the cache ends it at the
/// next tick. Returns `None` when called outside a Tokio runtime; the caller
/// decides whether that is worth a warning.
pub fn spawn_sweep_task<T: SweepTarget>(
    target: Weak<T>,
    interval: Duration,
    epoch: u64,
) -> Option<JoinHandle<()>> {
    let runtime = Handle::try_current().ok()?;

    Some(runtime.spawn(async move {
        debug!(epoch, interval_ms = interval.as_millis() as u64, "TTL sweep started");

        loop {
            tokio::time::sleep(interval).await;

            let Some(target) = target.upgrade() else {
                debug!(epoch, "TTL sweep target dropped");
                break;
            };

            match target.sweep_expired(epoch) {
                SweepOutcome::Swept { removed } if removed > 0 => {
                    info!("TTL sweep: removed {} expired entries", removed);
                }
                SweepOutcome::Swept { .. } => {
                    debug!("TTL sweep: no expired entries found");
                }
                SweepOutcome::Drained { removed } => {
                    if removed > 0 {
                        info!("TTL sweep: removed {} expired entries", removed);
                    }
                    debug!(epoch, "TTL sweep stopped, cache is empty");
                    break;
                }
                SweepOutcome::Superseded => {
                    debug!(epoch, "TTL sweep superseded");
                    break;
                }
            }
        }
    }))
}
