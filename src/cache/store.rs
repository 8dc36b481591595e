//! Cache Store Module
//!
//! The sharding façade: hashes each key once, routes the operation to
//! exactly one of 256 independently locked shards, and aggregates their
//! statistics. No operation ever touches two shards, which is why
//! shard-level locking is all the synchronization the cache needs.

use std::fmt;
use std::sync::Arc;

use ahash::RandomState;
use tracing::info;

use crate::cache::shard::Shard;
use crate::cache::stats::CacheStats;
use crate::cache::{MIN_CAPACITY, SHARD_COUNT};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::Result;

// == Cache ==
/// Sharded in-memory cache storing records in fixed-size circular logs.
///
/// Construction allocates all storage up front; nothing is allocated per
/// entry afterwards. Values come back as owned copies because the logs
/// recycle their bytes under capacity pressure.
pub struct Cache {
    /// The partitions, each embedding its own lock
    shards: Box<[Shard]>,
    /// Keyed hasher; fixed seeds keep shard routing deterministic
    hasher: RandomState,
}

impl Cache {
    // == Constructors ==
    /// Creates a cache with `total_capacity` bytes split evenly across the
    /// shards, floored at the minimum capacity. Expiry follows wall-clock
    /// time.
    pub fn new(total_capacity: usize) -> Self {
        Self::with_clock(total_capacity, Arc::new(SystemClock))
    }

    /// Creates a cache that reads time from the supplied clock.
    ///
    /// # Arguments
    /// * `total_capacity` - Total byte budget, split evenly across shards
    /// * `clock` - Time source consulted for expiry checks and access stamps
    pub fn with_clock(total_capacity: usize, clock: Arc<dyn Clock>) -> Self {
        let shard_capacity = total_capacity.max(MIN_CAPACITY) / SHARD_COUNT;
        let shards: Box<[Shard]> = (0..SHARD_COUNT)
            .map(|_| Shard::new(shard_capacity, clock.clone()))
            .collect();

        info!(
            "Cache ready: {} shards of {} bytes each",
            SHARD_COUNT, shard_capacity
        );

        Self {
            shards,
            hasher: RandomState::with_seeds(
                0x8e5a_3c1f_0b6d_42e7,
                0x17d4_92ab_c8f0_6e35,
                0xa20b_57e9_1d83_f4c6,
                0x6fc1_08d2_e49b_a573,
            ),
        }
    }

    /// Creates a cache from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.capacity_bytes)
    }

    // == Routing ==
    fn hash(&self, key: &[u8]) -> u64 {
        self.hasher.hash_one(key)
    }

    /// The low eight hash bits pick the shard; the next 24 stay available
    /// to the shard's own index.
    fn shard_for(&self, hash: u64) -> &Shard {
        &self.shards[(hash & (SHARD_COUNT as u64 - 1)) as usize]
    }

    // == Set ==
    /// Stores `value` under `key`, expiring `expire_seconds` from now.
    /// An `expire_seconds` of 0 means the record never expires.
    ///
    /// # Errors
    /// - `KeyTooLarge` when the key exceeds the maximum key length.
    /// - `EntryTooLarge` when key plus value exceeds a quarter of one
    ///   shard's capacity.
    pub fn set(&self, key: &[u8], value: &[u8], expire_seconds: u32) -> Result<()> {
        let hash = self.hash(key);
        self.shard_for(hash).set(key, value, hash, expire_seconds)
    }

    // == Get ==
    /// Returns a copy of the value stored under `key`.
    ///
    /// # Errors
    /// `NotFound` when the key is absent, deleted, expired, or was evicted
    /// by capacity pressure.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        let hash = self.hash(key);
        self.shard_for(hash).get(key, hash)
    }

    // == Delete ==
    /// Removes the record stored under `key`.
    ///
    /// # Errors
    /// `NotFound` when no live record holds the key.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        let hash = self.hash(key);
        self.shard_for(hash).delete(key, hash)
    }

    // == Vacuum ==
    /// Sweeps every shard, dropping index pointers whose bytes were
    /// recycled and records past their deadline. Returns the number of
    /// records reclaimed.
    ///
    /// Shards are swept one at a time, so the cache stays available to
    /// other callers throughout.
    pub fn vacuum(&self) -> Result<usize> {
        let mut reclaimed = 0;
        for shard in self.shards.iter() {
            reclaimed += shard.vacuum()?;
        }
        Ok(reclaimed)
    }

    // == Stats ==
    /// Point-in-time aggregate of every shard's counters.
    ///
    /// Counters are read without taking shard locks, so a snapshot taken
    /// during concurrent writes is approximate.
    pub fn stats(&self) -> CacheStats {
        let mut totals = CacheStats::new();
        for shard in self.shards.iter() {
            shard.stats().accumulate(&mut totals);
        }
        totals
    }

    // == Diagnostics ==
    /// Current log offset of the live record under `key`, if any.
    ///
    /// In-place overwrites keep a record's offset; grown overwrites and
    /// promotions move it.
    pub fn offset_of(&self, key: &[u8]) -> Option<u64> {
        let hash = self.hash(key);
        self.shard_for(hash).offset_of(key, hash)
    }

    // == Length ==
    /// Records currently indexed across all shards.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.entry_count() as usize)
            .sum()
    }

    // == Is Empty ==
    /// Returns true if no shard indexes any record.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // == Clear ==
    /// Drops every record in every shard.
    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.clear();
        }
    }
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("shard_count", &self.shards.len())
            .field("entry_count", &self.len())
            .finish()
    }
}
