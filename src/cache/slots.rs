//! Slot Index Module
//!
//! Per-shard pointer table: 256 buckets keyed by eight hash bits, each
//! bucket sorted by a further 16-bit fragment so lookups binary-search to
//! the fragment run and then confirm full key bytes against the log.

use crate::cache::record::RecordHeader;
use crate::cache::ring::CircularLog;
use crate::cache::SLOT_COUNT;

// == Record Pointer ==
/// Location of one record in the shard's log.
///
/// Pointers are not eagerly removed when the ring overwrites their bytes;
/// a pointer whose offset has dropped below the log's `begin` is stale and
/// gets pruned on the bucket's next visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordPointer {
    /// Logical offset of the record header
    pub offset: u64,
    /// Hash bits 16..32, the bucket's sort key
    pub hash_fragment: u16,
    /// Key length, compared before touching key bytes
    pub key_len: u16,
}

// == Slot Index ==
/// Bucketed, fragment-sorted index over a shard's records.
#[derive(Debug)]
pub struct SlotIndex {
    slots: Vec<Vec<RecordPointer>>,
}

impl SlotIndex {
    // == Constructor ==
    /// Creates an index with every bucket empty.
    pub fn new() -> Self {
        Self {
            slots: (0..SLOT_COUNT).map(|_| Vec::new()).collect(),
        }
    }

    // == Lookup ==
    /// Position of the pointer whose record stores `key`, if any.
    ///
    /// Binary-searches to the first pointer with the wanted fragment, then
    /// walks the run of equal fragments comparing key length and key bytes
    /// in the log. Stale pointers fail the byte comparison and are skipped.
    pub fn lookup(
        &self,
        log: &CircularLog,
        slot_id: u8,
        fragment: u16,
        key: &[u8],
    ) -> Option<usize> {
        let bucket = &self.slots[slot_id as usize];
        let start = bucket.partition_point(|p| p.hash_fragment < fragment);
        for (run, ptr) in bucket[start..].iter().enumerate() {
            if ptr.hash_fragment != fragment {
                break;
            }
            if ptr.key_len as usize == key.len()
                && log.equal_at(key, ptr.offset + RecordHeader::SIZE as u64)
            {
                return Some(start + run);
            }
        }
        None
    }

    // == Insert ==
    /// Adds `pointer` to its bucket, keeping the fragment order.
    pub fn insert(&mut self, slot_id: u8, pointer: RecordPointer) {
        let bucket = &mut self.slots[slot_id as usize];
        let pos = bucket.partition_point(|p| p.hash_fragment < pointer.hash_fragment);
        bucket.insert(pos, pointer);
    }

    // == Remove ==
    /// Removes the pointer at `pos`, preserving the bucket's order.
    pub fn remove(&mut self, slot_id: u8, pos: usize) -> RecordPointer {
        self.slots[slot_id as usize].remove(pos)
    }

    /// Copies out the pointer at `pos`.
    pub fn pointer(&self, slot_id: u8, pos: usize) -> RecordPointer {
        self.slots[slot_id as usize][pos]
    }

    /// Redirects the pointer at `pos` to a record's new home.
    ///
    /// Only the offset moves; the fragment is unchanged, so the bucket
    /// stays sorted.
    pub fn update_offset(&mut self, slot_id: u8, pos: usize, offset: u64) {
        self.slots[slot_id as usize][pos].offset = offset;
    }

    // == Prune Stale ==
    /// Drops every pointer in the bucket that the window has slid past.
    /// Returns how many were dropped.
    pub fn prune_stale(&mut self, slot_id: u8, begin: u64) -> usize {
        let bucket = &mut self.slots[slot_id as usize];
        let before = bucket.len();
        bucket.retain(|p| p.offset >= begin);
        before - bucket.len()
    }

    /// Pointers currently held in one bucket.
    pub fn bucket_len(&self, slot_id: u8) -> usize {
        self.slots[slot_id as usize].len()
    }

    /// Drops every pointer in every bucket.
    pub fn clear(&mut self) {
        for bucket in &mut self.slots {
            bucket.clear();
        }
    }
}
