//! Shard Module
//!
//! One independently locked partition of the cache: a circular log holding
//! the records, a slot index locating them, and the counters tracking what
//! happened to them. A single writer lock guards log and index together
//! because a store mutates both in one step.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::cache::record::RecordHeader;
use crate::cache::ring::CircularLog;
use crate::cache::slots::{RecordPointer, SlotIndex};
use crate::cache::stats::ShardStats;
use crate::cache::{MAX_KEY_LEN, SLOT_COUNT};
use crate::clock::Clock;
use crate::error::{CacheError, Result};

// == Hash Routing ==
/// Bits 8..16 of the key hash pick the bucket; the low eight picked the shard.
fn slot_id(hash: u64) -> u8 {
    (hash >> 8) as u8
}

/// Bits 16..32 of the key hash, the bucket's sort key.
fn hash_fragment(hash: u64) -> u16 {
    (hash >> 16) as u16
}

/// Largest key+value span one record may carry.
///
/// Capping records at a quarter of the log keeps a single append from
/// flushing most of the shard's working set.
fn entry_limit(capacity: usize) -> usize {
    capacity / 4 - RecordHeader::SIZE
}

/// True when fewer than a quarter of the log's capacity remains before the
/// window slides past `offset`.
fn near_eviction(log: &CircularLog, offset: u64) -> bool {
    let capacity = log.capacity() as u64;
    log.end() - offset > capacity - capacity / 4
}

// == Shard ==
/// One lockable partition of the key space.
pub struct Shard {
    /// Log and index mutate together, so one lock guards both
    state: RwLock<ShardState>,
    /// Counters, readable without the lock
    stats: ShardStats,
    /// Time source for expiry checks and access stamps
    clock: Arc<dyn Clock>,
}

/// The storage halves every operation works on.
#[derive(Debug)]
struct ShardState {
    log: CircularLog,
    index: SlotIndex,
}

impl ShardState {
    /// Drops pointers in the bucket that the window slid past.
    fn prune(&mut self, slot_id: u8) -> usize {
        self.index.prune_stale(slot_id, self.log.begin())
    }

    /// Position of the live pointer storing `key`, if any.
    fn find(&self, slot_id: u8, fragment: u16, key: &[u8]) -> Option<usize> {
        self.index.lookup(&self.log, slot_id, fragment, key)
    }

    /// Reads the record header at `offset`.
    fn read_header(&self, offset: u64) -> Result<RecordHeader> {
        let mut buf = [0u8; RecordHeader::SIZE];
        self.log.read_at(&mut buf, offset)?;
        Ok(RecordHeader::decode(&buf))
    }

    /// Marks the record deleted in place and drops its pointer.
    ///
    /// The log never compacts, so the bytes stay put until the window
    /// slides past them; only the index forgets the record immediately.
    fn tombstone(&mut self, slot_id: u8, pos: usize) -> Result<()> {
        let ptr = self.index.remove(slot_id, pos);
        let mut header = self.read_header(ptr.offset)?;
        header.deleted = true;
        self.log.write_at(&header.encode(), ptr.offset)
    }

    /// Appends a full record and claims its slack, returning its offset.
    fn append(&mut self, header: &RecordHeader, key: &[u8], value: &[u8]) -> Result<u64> {
        let offset = self.log.write(&header.encode())?;
        self.log.write(key)?;
        self.log.write(value)?;
        self.log.skip(header.value_capacity as usize - value.len());
        Ok(offset)
    }
}

impl Shard {
    // == Constructor ==
    /// Creates an empty shard over `capacity` bytes of log storage.
    pub fn new(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(ShardState {
                log: CircularLog::new(capacity),
                index: SlotIndex::new(),
            }),
            stats: ShardStats::new(),
            clock,
        }
    }

    // == Set ==
    /// Stores `value` under `key`, expiring `expire_seconds` from now
    /// (0 means never).
    ///
    /// A record whose reserved capacity still fits the new value is
    /// overwritten in place at its current offset. Otherwise the old record
    /// is tombstoned and a copy with doubled capacity is appended at the
    /// tail, which may push the oldest records in the shard out of the
    /// window.
    ///
    /// # Errors
    /// - `KeyTooLarge` when the key exceeds the maximum key length.
    /// - `EntryTooLarge` when key plus value exceeds a quarter of the log.
    pub fn set(&self, key: &[u8], value: &[u8], hash: u64, expire_seconds: u32) -> Result<()> {
        if key.len() > MAX_KEY_LEN {
            return Err(CacheError::KeyTooLarge(key.len()));
        }

        let slot_id = slot_id(hash);
        let fragment = hash_fragment(hash);
        let now = self.clock.now();
        let expire_at = if expire_seconds > 0 {
            now.saturating_add(expire_seconds)
        } else {
            0
        };

        let mut guard = self.state.write();
        let state = &mut *guard;

        let limit = entry_limit(state.log.capacity());
        if key.len() + value.len() > limit {
            return Err(CacheError::EntryTooLarge {
                size: key.len() + value.len(),
                limit,
            });
        }

        let pruned = state.prune(slot_id);
        if pruned > 0 {
            self.stats.record_evictions(pruned as u64);
        }

        let mut value_capacity = value.len().max(1) as u32;
        if let Some(pos) = state.find(slot_id, fragment, key) {
            let offset = state.index.pointer(slot_id, pos).offset;
            let mut header = state.read_header(offset)?;
            let old_access = header.access_time;
            header.access_time = now;
            header.expire_at = expire_at;
            header.value_len = value.len() as u32;

            if header.value_capacity >= header.value_len {
                state.log.write_at(&header.encode(), offset)?;
                state.log.write_at(value, offset + header.value_offset() as u64)?;
                self.stats.record_overwrite();
                self.stats
                    .add_access_time(u64::from(now.saturating_sub(old_access)));
                return Ok(());
            }

            // The slack is spent: retire the record and append a grown copy.
            let mut grown = header.value_capacity.max(1);
            while grown < header.value_len {
                grown = grown.saturating_mul(2);
            }
            value_capacity = grown.min((limit - key.len()) as u32);
            state.tombstone(slot_id, pos)?;
            self.stats.record_removal();
        }

        let header = RecordHeader {
            access_time: now,
            expire_at,
            key_len: key.len() as u16,
            hash_fragment: fragment,
            value_len: value.len() as u32,
            value_capacity,
            deleted: false,
            slot_id,
        };
        let offset = state.append(&header, key, value)?;
        state.index.insert(
            slot_id,
            RecordPointer {
                offset,
                hash_fragment: fragment,
                key_len: header.key_len,
            },
        );
        self.stats.record_insert(u64::from(now));
        Ok(())
    }

    // == Get ==
    /// Returns a copy of the value stored under `key`.
    ///
    /// The copy is deliberate: the log may recycle the record's bytes the
    /// moment the lock is released. A record found drifting into the oldest
    /// quarter of the window is re-appended at the tail so keys that keep
    /// getting read outlive the FIFO sweep.
    ///
    /// # Errors
    /// `NotFound` when the key is absent, deleted, expired, or evicted.
    pub fn get(&self, key: &[u8], hash: u64) -> Result<Vec<u8>> {
        let slot_id = slot_id(hash);
        let fragment = hash_fragment(hash);
        let now = self.clock.now();

        let mut guard = self.state.write();
        let state = &mut *guard;

        let pruned = state.prune(slot_id);
        if pruned > 0 {
            self.stats.record_evictions(pruned as u64);
        }

        let Some(pos) = state.find(slot_id, fragment, key) else {
            self.stats.record_miss();
            return Err(CacheError::NotFound);
        };

        let offset = state.index.pointer(slot_id, pos).offset;
        let mut header = state.read_header(offset)?;

        if header.is_expired(now) {
            state.tombstone(slot_id, pos)?;
            self.stats.record_expiration();
            self.stats.record_miss();
            return Err(CacheError::NotFound);
        }

        let old_access = header.access_time;
        header.access_time = now;
        state.log.write_at(&header.encode(), offset)?;
        self.stats
            .add_access_time(u64::from(now.saturating_sub(old_access)));

        let mut value = vec![0u8; header.value_len as usize];
        state.log.read_at(&mut value, offset + header.value_offset() as u64)?;

        if near_eviction(&state.log, offset) {
            let new_offset = state.append(&header, key, &value)?;
            state.index.update_offset(slot_id, pos, new_offset);
            self.stats.record_touch();
        }

        self.stats.record_hit();
        Ok(value)
    }

    // == Delete ==
    /// Tombstones the record under `key` and forgets its pointer.
    ///
    /// # Errors
    /// `NotFound` when no live record holds the key.
    pub fn delete(&self, key: &[u8], hash: u64) -> Result<()> {
        let slot_id = slot_id(hash);
        let fragment = hash_fragment(hash);

        let mut guard = self.state.write();
        let state = &mut *guard;

        let pruned = state.prune(slot_id);
        if pruned > 0 {
            self.stats.record_evictions(pruned as u64);
        }

        let Some(pos) = state.find(slot_id, fragment, key) else {
            return Err(CacheError::NotFound);
        };
        state.tombstone(slot_id, pos)?;
        self.stats.record_removal();
        Ok(())
    }

    // == Vacuum ==
    /// Sweeps every bucket, dropping pointers the window slid past and
    /// tombstoning records past their deadline.
    ///
    /// Returns the number of records reclaimed. Expiry is otherwise only
    /// detected when a key is looked up, so a shard full of abandoned
    /// records keeps them indexed until this runs.
    pub fn vacuum(&self) -> Result<usize> {
        let now = self.clock.now();
        let mut guard = self.state.write();
        let state = &mut *guard;
        let mut reclaimed = 0;

        for slot in 0..SLOT_COUNT {
            let slot_id = slot as u8;
            let pruned = state.prune(slot_id);
            if pruned > 0 {
                self.stats.record_evictions(pruned as u64);
                reclaimed += pruned;
            }

            // Walk back to front so removals leave unvisited positions alone.
            let mut pos = state.index.bucket_len(slot_id);
            while pos > 0 {
                pos -= 1;
                let offset = state.index.pointer(slot_id, pos).offset;
                if state.read_header(offset)?.is_expired(now) {
                    state.tombstone(slot_id, pos)?;
                    self.stats.record_expiration();
                    reclaimed += 1;
                }
            }
        }
        Ok(reclaimed)
    }

    // == Diagnostics ==
    /// Current log offset of the live record under `key`.
    ///
    /// In-place overwrites keep the offset; grown overwrites and promotions
    /// move it. Takes the shared lock since nothing mutates.
    pub fn offset_of(&self, key: &[u8], hash: u64) -> Option<u64> {
        let state = self.state.read();
        let pos = state.find(slot_id(hash), hash_fragment(hash), key)?;
        Some(state.index.pointer(slot_id(hash), pos).offset)
    }

    /// Records currently indexed by this shard.
    pub fn entry_count(&self) -> u64 {
        self.stats.entry_count()
    }

    /// This shard's counters.
    pub fn stats(&self) -> &ShardStats {
        &self.stats
    }

    // == Clear ==
    /// Drops every record and resets the log to its initial state.
    pub fn clear(&self) {
        let mut guard = self.state.write();
        guard.log.reset();
        guard.index.clear();
        self.stats.clear();
    }
}
