//! Clock Module
//!
//! Whole-second time source behind a trait so expiry can be driven
//! deterministically in tests.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

// == Clock Trait ==
/// Source of the current time as seconds since the Unix epoch.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current time in whole seconds.
    fn now(&self) -> u32;
}

// == System Clock ==
/// Wall-clock time source, the default for production caches.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u32 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards")
            .as_secs() as u32
    }
}

// == Manual Clock ==
/// Hand-advanced time source for deterministic expiry tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU32,
}

impl ManualClock {
    /// Creates a clock reading `start` seconds.
    pub fn new(start: u32) -> Self {
        Self {
            now: AtomicU32::new(start),
        }
    }

    /// Jumps the clock to `now` seconds.
    pub fn set(&self, now: u32) {
        self.now.store(now, Ordering::Relaxed);
    }

    /// Moves the clock forward by `seconds`.
    pub fn advance(&self, seconds: u32) {
        self.now.fetch_add(seconds, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u32 {
        self.now.load(Ordering::Relaxed)
    }
}
