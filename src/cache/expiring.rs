//! Expiring Cache Module
//!
//! Key/value container where every entry carries an absolute expiry time.
//! Expiry is enforced lazily on `get` and eagerly by a background sweep that
//! only runs while the cache tracks at least one entry.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use lru::LruCache;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::{CacheStats, Clock, SystemClock};
use crate::config::Config;
use crate::tasks::{spawn_sweep_task, SweepOutcome, SweepTarget};

// == Expiring Cache ==
/// TTL container with lazy and background expiry.
///
/// All methods take `&self`; one internal lock serializes foreground calls
/// and sweep passes. Share it across tasks with `Arc<ExpiringCache<..>>`.
///
/// The background sweep needs a Tokio runtime. Every insert made inside one
/// restarts the sweep if it is not running; until then expiry is enforced by
/// `get` alone.
pub struct ExpiringCache<K, V, C: Clock = SystemClock> {
    shared: Arc<Shared<K, V, C>>,
}

struct Shared<K, V, C> {
    state: Mutex<State<K, V>>,
    clock: C,
    /// Sweep period and default TTL, in milliseconds
    interval_ms: i64,
}

struct State<K, V> {
    /// Values in insertion order. Read through `peek` only so the order stays put.
    values: LruCache<K, V>,
    /// Absolute expiry per key (Unix ms), always the same key set as `values`
    expiries: HashMap<K, u64>,
    /// Handle of the running sweep, if any
    sweep: Option<JoinHandle<()>>,
    /// Identifies the sweeper allowed to act on this state
    sweep_epoch: u64,
    stats: CacheStats,
}

impl<K: Eq + Hash, V> State<K, V> {
    fn new() -> Self {
        Self {
            values: LruCache::unbounded(),
            expiries: HashMap::new(),
            sweep: None,
            sweep_epoch: 0,
            stats: CacheStats::new(),
        }
    }

    /// Removes `key` from both stores.
    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.expiries.remove(key);
        self.values.pop(key)
    }

    /// Removes every entry whose expiry is strictly before `now`.
    fn remove_expired(&mut self, now: u64) -> usize
    where
        K: Clone,
    {
        let expired: Vec<K> = self
            .expiries
            .iter()
            .filter(|(_, expires_at)| now > **expires_at)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove(key);
        }

        self.stats.record_expirations(expired.len());
        expired.len()
    }

    /// Whether a sweep task is scheduled and still alive.
    ///
    /// A task also ends when the runtime that owned it shuts down.
    fn sweep_is_live(&self) -> bool {
        self.sweep.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    fn cancel_sweep(&mut self) {
        if let Some(handle) = self.sweep.take() {
            handle.abort();
            debug!(epoch = self.sweep_epoch, "TTL sweep cancelled");
        }
    }

    /// Cancels the sweep once nothing is left to expire.
    fn cancel_sweep_if_idle(&mut self) {
        if self.expiries.is_empty() {
            self.cancel_sweep();
        }
    }
}

impl<K, V, C> SweepTarget for Shared<K, V, C>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Send + 'static,
    C: Clock,
{
    fn sweep_expired(&self, epoch: u64) -> SweepOutcome {
        let now = self.clock.now_ms();
        let mut state = self.state.lock();

        if state.sweep.is_none() || state.sweep_epoch != epoch {
            return SweepOutcome::Superseded;
        }

        let removed = state.remove_expired(now);
        if state.expiries.is_empty() {
            // The caller is this very task and is about to return
            state.sweep = None;
            return SweepOutcome::Drained { removed };
        }

        SweepOutcome::Swept { removed }
    }
}

impl<K, V> ExpiringCache<K, V, SystemClock>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    // == Constructor ==
    /// Creates a cache whose sweep runs every `sweep_interval_ms`.
    ///
    /// The interval is also the default TTL. Zero or a negative value disables
    /// the sweep; entries then leave only through `get`, `delete` or `clear`.
    pub fn new(sweep_interval_ms: i64) -> Self {
        Self::with_clock(sweep_interval_ms, SystemClock)
    }

    /// Creates a cache using `config.sweep_interval_ms`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.sweep_interval_ms)
    }
}

impl<K, V, C> ExpiringCache<K, V, C>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
    C: Clock,
{
    /// Creates a cache reading time from `clock`.
    pub fn with_clock(sweep_interval_ms: i64, clock: C) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::new()),
                clock,
                interval_ms: sweep_interval_ms,
            }),
        }
    }

    // == Set ==
    /// Stores `value` under `key` with the default TTL (the sweep interval).
    pub fn set(&self, key: K, value: V) -> &Self {
        self.set_with_ttl(key, value, self.shared.interval_ms)
    }

    /// Stores `value` under `key`, expiring `ttl_ms` from now.
    ///
    /// Overwriting refreshes the expiry. A TTL of zero expires as soon as the
    /// clock moves; a negative TTL is already expired.
    pub fn set_with_ttl(&self, key: K, value: V, ttl_ms: i64) -> &Self {
        let expires_at = self.shared.clock.now_ms().saturating_add_signed(ttl_ms);
        let mut state = self.shared.state.lock();
        let was_empty = state.expiries.is_empty();

        match state.values.peek_mut(&key) {
            Some(slot) => *slot = value,
            None => {
                state.values.push(key.clone(), value);
            }
        }
        state.expiries.insert(key, expires_at);

        self.ensure_sweep(&mut state, was_empty);
        self
    }

    /// Schedules the sweep unless a live one already runs.
    ///
    /// Outside a Tokio runtime nothing is spawned; the warning is only logged
    /// when the cache has just received its first entry.
    fn ensure_sweep(&self, state: &mut State<K, V>, was_empty: bool) {
        if self.shared.interval_ms <= 0 || state.sweep_is_live() {
            return;
        }

        state.sweep_epoch += 1;
        let interval = Duration::from_millis(self.shared.interval_ms as u64);
        state.sweep = spawn_sweep_task(Arc::downgrade(&self.shared), interval, state.sweep_epoch);

        if state.sweep.is_none() && was_empty {
            warn!("no Tokio runtime available; TTL sweep deferred, expiry is lazy only");
        }
    }

    // == Get ==
    /// Returns the value for `key` unless it is absent or expired.
    ///
    /// An expired entry found here is removed immediately.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.shared.clock.now_ms();
        let mut state = self.shared.state.lock();

        let Some(&expires_at) = state.expiries.get(key) else {
            state.stats.record_miss();
            return None;
        };

        if now > expires_at {
            state.remove(key);
            state.stats.record_expirations(1);
            state.stats.record_miss();
            state.cancel_sweep_if_idle();
            return None;
        }

        let value = state.values.peek(key).cloned();
        state.stats.record_hit();
        value
    }

    // == Delete ==
    /// Removes `key`, returning whether it was present.
    ///
    /// Presence ignores expiry: an expired entry not yet swept counts.
    pub fn delete<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut state = self.shared.state.lock();
        let removed = state.remove(key).is_some();
        state.cancel_sweep_if_idle();
        removed
    }

    // == Clear ==
    /// Removes every entry and stops the sweep.
    pub fn clear(&self) {
        let mut state = self.shared.state.lock();
        state.values.clear();
        state.expiries.clear();
        state.cancel_sweep();
    }

    // == Purge Expired ==
    /// Runs one sweep pass immediately, returning how many entries it removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.shared.clock.now_ms();
        let mut state = self.shared.state.lock();
        let removed = state.remove_expired(now);
        state.cancel_sweep_if_idle();
        removed
    }

    // == Inspection ==
    /// Whether `key` is stored, expired or not.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.shared.state.lock().values.contains(key)
    }

    /// Absolute expiry of `key` in Unix milliseconds.
    pub fn expires_at<Q>(&self, key: &Q) -> Option<u64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.shared.state.lock().expiries.get(key).copied()
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.shared.state.lock().values.len()
    }

    /// Whether no entries are stored, expired or not.
    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().values.is_empty()
    }

    /// Snapshot of keys in insertion order.
    pub fn keys(&self) -> Vec<K> {
        let state = self.shared.state.lock();
        state.values.iter().rev().map(|(key, _)| key.clone()).collect()
    }

    /// Snapshot of values in insertion order.
    pub fn values(&self) -> Vec<V> {
        let state = self.shared.state.lock();
        state.values.iter().rev().map(|(_, value)| value.clone()).collect()
    }

    /// Snapshot of entries in insertion order.
    pub fn entries(&self) -> Vec<(K, V)> {
        let state = self.shared.state.lock();
        state
            .values
            .iter()
            .rev()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Sweep period and default TTL in milliseconds.
    pub fn sweep_interval_ms(&self) -> i64 {
        self.shared.interval_ms
    }

    /// Whether a background sweep is currently scheduled.
    pub fn is_sweeping(&self) -> bool {
        self.shared.state.lock().sweep_is_live()
    }

    /// Size of the expiry index, which must always match `len`.
    #[cfg(test)]
    pub(crate) fn tracked_expiries(&self) -> usize {
        self.shared.state.lock().expiries.len()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.shared.state.lock();
        let mut stats = state.stats.clone();
        stats.set_total_entries(state.values.len());
        stats
    }
}

impl<K, V, C: Clock> Drop for ExpiringCache<K, V, C> {
    fn drop(&mut self) {
        if let Some(handle) = self.shared.state.lock().sweep.take() {
            handle.abort();
        }
    }
}

impl<K: Eq + Hash, V, C: Clock> fmt::Debug for ExpiringCache<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("ExpiringCache")
            .field("len", &state.values.len())
            .field("interval_ms", &self.shared.interval_ms)
            .field("sweeping", &state.sweep.is_some())
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;

    fn manual_cache(interval_ms: i64) -> (ExpiringCache<&'static str, i32, ManualClock>, ManualClock) {
        let clock = ManualClock::new(1_000_000);
        (ExpiringCache::with_clock(interval_ms, clock.clone()), clock)
    }

    #[test]
    fn test_new_is_empty() {
        let cache: ExpiringCache<String, String> = ExpiringCache::new(0);
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
        assert!(!cache.is_sweeping());
    }

    #[test]
    fn test_set_and_get() {
        let (cache, _clock) = manual_cache(0);
        cache.set_with_ttl("a", 1, 100);

        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn test_string_keys_lookup_by_str() {
        let cache: ExpiringCache<String, i32> = ExpiringCache::new(0);
        cache.set_with_ttl("key".to_string(), 5, 60_000);

        assert_eq!(cache.get("key"), Some(5));
        assert!(cache.contains_key("key"));
    }

    #[test]
    fn test_lazy_expiry_scenario() {
        let (cache, clock) = manual_cache(0);
        cache.set_with_ttl("a", 1, 50);
        assert_eq!(cache.get("a"), Some(1));

        clock.advance(60);
        assert_eq!(cache.get("a"), None);
        assert!(!cache.contains_key("a"), "expired entry is removed by get");
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let (cache, clock) = manual_cache(0);
        cache.set_with_ttl("a", 1, 50);

        clock.advance(49);
        assert_eq!(cache.get("a"), Some(1));
        clock.advance(1);
        assert_eq!(cache.get("a"), Some(1), "still readable at exactly the expiry instant");
        clock.advance(1);
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_zero_ttl_expires_once_clock_moves() {
        let (cache, clock) = manual_cache(0);
        cache.set_with_ttl("a", 1, 0);
        assert_eq!(cache.get("a"), Some(1));

        clock.advance(1);
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_negative_ttl_is_already_expired() {
        let (cache, _clock) = manual_cache(0);
        cache.set_with_ttl("a", 1, -10);

        assert!(cache.contains_key("a"));
        assert_eq!(cache.get("a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_default_ttl_is_sweep_interval() {
        let (cache, _clock) = manual_cache(0);
        cache.set("a", 1);
        assert_eq!(cache.expires_at("a"), Some(1_000_000));

        let negative: ExpiringCache<&str, i32, ManualClock> =
            ExpiringCache::with_clock(-1, ManualClock::new(500));
        negative.set("b", 2);
        assert_eq!(negative.expires_at("b"), Some(499));
    }

    #[test]
    fn test_overwrite_refreshes_expiry_and_keeps_order() {
        let (cache, clock) = manual_cache(0);
        cache.set_with_ttl("a", 1, 50).set_with_ttl("b", 2, 50);

        clock.advance(40);
        cache.set_with_ttl("a", 10, 50);

        clock.advance(20);
        assert_eq!(cache.get("a"), Some(10));
        assert_eq!(cache.get("b"), None);

        cache.set_with_ttl("c", 3, 50).set_with_ttl("a", 11, 50);
        assert_eq!(cache.keys(), vec!["a", "c"]);
    }

    #[test]
    fn test_delete_reports_presence() {
        let (cache, _clock) = manual_cache(0);
        cache.set_with_ttl("a", 1, 100);

        assert!(cache.delete("a"));
        assert!(!cache.delete("a"));
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.expires_at("a"), None);
    }

    #[test]
    fn test_delete_counts_expired_unswept_entry() {
        let (cache, clock) = manual_cache(0);
        cache.set_with_ttl("a", 1, 10);
        clock.advance(100);

        assert!(cache.delete("a"));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (cache, _clock) = manual_cache(0);
        cache.set_with_ttl("a", 1, 100).set_with_ttl("b", 2, 100);

        cache.clear();
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.expires_at("a"), None);

        cache.clear();
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_iteration_ignores_expiry_until_swept() {
        let (cache, clock) = manual_cache(0);
        cache.set_with_ttl("a", 1, 10).set_with_ttl("b", 2, 1_000);
        clock.advance(100);

        assert_eq!(cache.entries(), vec![("a", 1), ("b", 2)]);
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.keys(), vec!["b"]);
        assert_eq!(cache.values(), vec![2]);
    }

    #[test]
    fn test_stats_track_reads_and_expirations() {
        let (cache, clock) = manual_cache(0);
        cache.set_with_ttl("a", 1, 10).set_with_ttl("b", 2, 10).set_with_ttl("c", 3, 1_000);

        cache.get("a");
        cache.get("zzz");
        clock.advance(50);
        cache.get("a");
        cache.purge_expired();

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.expirations, 2);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_no_sweep_without_runtime() {
        let (cache, _clock) = manual_cache(10);
        cache.set("a", 1);

        assert!(!cache.is_sweeping());
        assert_eq!(cache.get("a"), Some(1));
    }

    fn current_thread_runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn test_sweep_starts_once_a_runtime_is_available() {
        let cache: ExpiringCache<&str, i32> = ExpiringCache::new(20);
        cache.set_with_ttl("warm", 0, 60_000);
        assert!(!cache.is_sweeping());

        let runtime = current_thread_runtime();
        runtime.block_on(async {
            cache.set_with_ttl("a", 1, 5);
            assert!(cache.is_sweeping(), "insert inside a runtime starts the sweep");
            tokio::time::sleep(Duration::from_millis(200)).await;
        });

        assert_eq!(cache.keys(), vec!["warm"]);
    }

    #[test]
    fn test_sweep_restarts_after_its_runtime_shuts_down() {
        let cache: ExpiringCache<&str, i32> = ExpiringCache::new(20);

        let first = current_thread_runtime();
        first.block_on(async {
            cache.set_with_ttl("keep", 0, 60_000);
        });
        assert!(cache.is_sweeping());
        drop(first);
        assert!(!cache.is_sweeping(), "task died with its runtime");

        let second = current_thread_runtime();
        second.block_on(async {
            cache.set_with_ttl("a", 1, 5);
            assert!(cache.is_sweeping());
            tokio::time::sleep(Duration::from_millis(200)).await;
        });

        assert_eq!(cache.keys(), vec!["keep"]);
    }

    #[tokio::test]
    async fn test_sweep_starts_on_first_insert() {
        let cache: ExpiringCache<&str, i32> = ExpiringCache::new(1_000);
        assert!(!cache.is_sweeping());

        cache.set("a", 1);
        assert!(cache.is_sweeping());
    }

    #[tokio::test]
    async fn test_zero_interval_never_sweeps() {
        let cache: ExpiringCache<&str, i32> = ExpiringCache::new(0);
        cache.set_with_ttl("a", 1, 1_000);

        assert!(!cache.is_sweeping());
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_entries_and_stops() {
        let cache: ExpiringCache<&str, i32> = ExpiringCache::new(20);
        cache.set_with_ttl("a", 1, 10).set_with_ttl("b", 2, 10);

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(cache.is_empty(), "sweep should remove expired entries");
        assert!(!cache.is_sweeping(), "sweep should stop once empty");
        assert_eq!(cache.stats().expirations, 2);
    }

    #[tokio::test]
    async fn test_sweep_preserves_live_entries() {
        let cache: ExpiringCache<&str, i32> = ExpiringCache::new(20);
        cache.set_with_ttl("short", 1, 10).set_with_ttl("long", 2, 60_000);

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(cache.keys(), vec!["long"]);
        assert!(cache.is_sweeping());
    }

    #[tokio::test]
    async fn test_sweep_restarts_after_drain() {
        let cache: ExpiringCache<&str, i32> = ExpiringCache::new(20);
        cache.set_with_ttl("a", 1, 5);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!cache.is_sweeping());

        cache.set_with_ttl("b", 2, 5);
        assert!(cache.is_sweeping());
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_delete_of_last_entry_cancels_sweep() {
        let cache: ExpiringCache<&str, i32> = ExpiringCache::new(1_000);
        cache.set("a", 1).set("b", 2);

        cache.delete("a");
        assert!(cache.is_sweeping());
        cache.delete("b");
        assert!(!cache.is_sweeping());
    }

    #[tokio::test]
    async fn test_lazy_expiry_of_last_entry_cancels_sweep() {
        let clock = ManualClock::new(0);
        let cache: ExpiringCache<&str, i32, ManualClock> =
            ExpiringCache::with_clock(1_000, clock.clone());
        cache.set_with_ttl("a", 1, 10);
        assert!(cache.is_sweeping());

        clock.advance(20);
        assert_eq!(cache.get("a"), None);
        assert!(!cache.is_sweeping());
    }

    #[tokio::test]
    async fn test_clear_cancels_sweep() {
        let cache: ExpiringCache<&str, i32> = ExpiringCache::new(1_000);
        cache.set("a", 1);

        cache.clear();
        assert!(!cache.is_sweeping());
        cache.clear();
        assert!(!cache.is_sweeping());
    }

    #[tokio::test]
    async fn test_stale_sweeper_is_superseded() {
        let cache: ExpiringCache<&str, i32> = ExpiringCache::new(1_000);
        cache.set("a", 1);
        let stale_epoch = cache.shared.state.lock().sweep_epoch;

        cache.clear();
        cache.set_with_ttl("b", 2, -1);

        assert_eq!(cache.shared.sweep_expired(stale_epoch), SweepOutcome::Superseded);
        assert!(cache.is_sweeping());
        assert_eq!(cache.keys(), vec!["b"], "stale sweeper must not touch the cache");

        let live_epoch = cache.shared.state.lock().sweep_epoch;
        assert_ne!(live_epoch, stale_epoch);
        assert_eq!(
            cache.shared.sweep_expired(live_epoch),
            SweepOutcome::Drained { removed: 1 }
        );
        assert!(cache.is_empty());
        assert!(!cache.is_sweeping());
    }

    #[tokio::test]
    async fn test_clear_and_refill_churn_keeps_one_sweeper() {
        let cache: ExpiringCache<String, usize> = ExpiringCache::new(2);

        for i in 0..50 {
            cache.set_with_ttl(format!("k{i}"), i, 1);
            if i % 3 == 0 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            cache.clear();
        }

        cache.set_with_ttl("short".to_string(), 1, 1);
        cache.set_with_ttl("long".to_string(), 2, 60_000);
        let epoch = cache.shared.state.lock().sweep_epoch;
        assert_eq!(epoch, 51, "one start per refill of an empty cache");

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(cache.keys(), vec!["long".to_string()]);
        assert!(cache.is_sweeping());
        assert_eq!(cache.shared.state.lock().sweep_epoch, epoch, "no sweeper was restarted");
    }

    #[tokio::test]
    async fn test_shared_across_tasks() {
        let cache: Arc<ExpiringCache<String, usize>> = Arc::new(ExpiringCache::new(1_000));

        let mut handles = Vec::new();
        for i in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache.set(format!("key{i}"), i);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(cache.len(), 8);
        assert_eq!(cache.get("key3"), Some(3));
    }
}
