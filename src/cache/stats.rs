//! Cache Statistics Module
//!
//! Per-shard atomic counters and the aggregated snapshot reported to callers.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Shard Stats ==
/// Running counters for one shard.
///
/// Counters are updated while the shard lock is held but read without it,
/// so every access goes through a relaxed atomic.
#[derive(Debug, Default)]
pub struct ShardStats {
    hits: AtomicU64,
    misses: AtomicU64,
    entry_count: AtomicU64,
    total_count: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
    overwrites: AtomicU64,
    touches: AtomicU64,
    total_time: AtomicU64,
}

impl ShardStats {
    // == Constructor ==
    /// Creates a ShardStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the hit counter.
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the miss counter.
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Accounts for a newly appended record stamped at `now`.
    pub fn record_insert(&self, now: u64) {
        self.entry_count.fetch_add(1, Ordering::Relaxed);
        self.total_count.fetch_add(1, Ordering::Relaxed);
        self.total_time.fetch_add(now, Ordering::Relaxed);
    }

    /// Increments the in-place overwrite counter.
    pub fn record_overwrite(&self) {
        self.overwrites.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the promotion counter.
    pub fn record_touch(&self) {
        self.touches.fetch_add(1, Ordering::Relaxed);
    }

    /// Accounts for `count` records the ring overwrote.
    pub fn record_evictions(&self, count: u64) {
        self.evictions.fetch_add(count, Ordering::Relaxed);
        self.entry_count.fetch_sub(count, Ordering::Relaxed);
    }

    /// Accounts for one record dropped past its deadline.
    pub fn record_expiration(&self) {
        self.expirations.fetch_add(1, Ordering::Relaxed);
        self.entry_count.fetch_sub(1, Ordering::Relaxed);
    }

    /// Accounts for one explicitly removed record.
    pub fn record_removal(&self) {
        self.entry_count.fetch_sub(1, Ordering::Relaxed);
    }

    /// Moves the access-time sum forward by `delta` seconds.
    pub fn add_access_time(&self, delta: u64) {
        self.total_time.fetch_add(delta, Ordering::Relaxed);
    }

    /// Records currently indexed by the shard.
    pub fn entry_count(&self) -> u64 {
        self.entry_count.load(Ordering::Relaxed)
    }

    /// Resets the usage counters after a shard wipe.
    ///
    /// Hit, miss, and eviction history survives a clear.
    pub fn clear(&self) {
        self.entry_count.store(0, Ordering::Relaxed);
        self.total_count.store(0, Ordering::Relaxed);
        self.total_time.store(0, Ordering::Relaxed);
    }

    /// Adds this shard's counters into `totals`.
    pub fn accumulate(&self, totals: &mut CacheStats) {
        totals.hits += self.hits.load(Ordering::Relaxed);
        totals.misses += self.misses.load(Ordering::Relaxed);
        totals.entry_count += self.entry_count.load(Ordering::Relaxed);
        totals.total_count += self.total_count.load(Ordering::Relaxed);
        totals.evictions += self.evictions.load(Ordering::Relaxed);
        totals.expirations += self.expirations.load(Ordering::Relaxed);
        totals.overwrites += self.overwrites.load(Ordering::Relaxed);
        totals.touches += self.touches.load(Ordering::Relaxed);
        totals.total_time += self.total_time.load(Ordering::Relaxed);
    }
}

// == Cache Stats ==
/// Point-in-time aggregate of every shard's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups that returned a live value
    pub hits: u64,
    /// Lookups that found nothing usable
    pub misses: u64,
    /// Records currently indexed
    pub entry_count: u64,
    /// Records inserted over the cache's lifetime
    pub total_count: u64,
    /// Records lost to the ring overwriting their bytes
    pub evictions: u64,
    /// Records dropped past their deadline
    pub expirations: u64,
    /// Stores absorbed in place by an existing record's slack
    pub overwrites: u64,
    /// Records re-appended at the tail to outlive an imminent wraparound
    pub touches: u64,
    /// Sum of the latest access times of all appended records, in Unix seconds
    pub total_time: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Mean Access Time ==
    /// Average last-access timestamp across appended records, 0 when none
    /// have been appended. Useful as a rough age-of-working-set gauge.
    pub fn mean_access_time(&self) -> u64 {
        if self.total_count == 0 {
            0
        } else {
            self.total_time / self.total_count
        }
    }
}
