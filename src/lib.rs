//! ringcache - A sharded in-memory cache over circular byte logs
//!
//! Records live serialized inside fixed-size ring buffers, one per shard:
//! no per-entry allocation, FIFO eviction of the oldest bytes under
//! capacity pressure, and promotion of frequently read records to keep
//! them ahead of the sweep.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{Cache, CacheStats};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_vacuum_task;
