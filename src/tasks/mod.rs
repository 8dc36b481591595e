//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the cache.
//!
//! # Tasks
//! - Vacuum: reclaims index pointers to recycled bytes and expired records

mod vacuum;

pub use vacuum::spawn_vacuum_task;
