//! Cache Module
//!
//! Sharded key-value storage over fixed-size circular byte logs.

mod record;
mod ring;
mod shard;
mod slots;
mod stats;
mod store;


// Re-export public types
pub use stats::CacheStats;
pub use store::Cache;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LEN: usize = 65535;

/// Number of independently locked shards
pub const SHARD_COUNT: usize = 256;

/// Number of pointer buckets within each shard
pub const SLOT_COUNT: usize = 256;

/// Smallest total capacity the cache will be built with, in bytes
pub const MIN_CAPACITY: usize = 512 * 1024;
