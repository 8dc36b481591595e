//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CacheError {
    /// Key exceeds the maximum encodable length
    #[error("Key too large: {0} bytes")]
    KeyTooLarge(usize),

    /// Key plus value exceeds the per-record limit for one shard
    #[error("Entry too large: {size} bytes exceeds the {limit} byte limit")]
    EntryTooLarge { size: usize, limit: usize },

    /// No live record under the key: absent, deleted, expired, or evicted
    #[error("Entry not found")]
    NotFound,

    /// A log access fell outside the addressable window
    #[error("Offset out of range: {len} bytes at {offset} outside window [{begin}, {end})")]
    OutOfRange {
        offset: u64,
        len: usize,
        begin: u64,
        end: u64,
    },
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
