//! Time source for expiry decisions
//!
//! Expiry is tracked in unix seconds. The manager reads the clock through a
//! trait object so tests can pin "now" to a known value.

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current unix time in seconds.
pub trait Clock: Send + Sync {
    fn now_secs(&self) -> i64;
}

/// Wall clock backed by `SystemTime`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }
}

/// Manually driven clock for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ManualClock(std::sync::atomic::AtomicI64);

#[cfg(test)]
impl ManualClock {
    pub(crate) fn new(secs: i64) -> Self {
        Self(std::sync::atomic::AtomicI64::new(secs))
    }

    pub(crate) fn set(&self, secs: i64) {
        self.0.store(secs, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now_secs(&self) -> i64 {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}
