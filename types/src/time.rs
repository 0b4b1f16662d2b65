//! Timestamp type and the clock abstraction used by the ledger and validator.
//!
//! Timestamps are Unix epoch seconds (UTC). Components never read the system
//! clock directly; they are handed a [`Clock`] so tests can pin time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Get the current system time as a `Timestamp`.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Whether more than `duration_secs` have passed since this timestamp.
    /// The window still holds at `self + duration_secs` itself.
    pub fn has_expired(&self, duration_secs: u64, now: Timestamp) -> bool {
        now.0 > self.0.saturating_add(duration_secs)
    }

    /// Seconds until [`has_expired`](Self::has_expired) turns true, zero
    /// once it has.
    pub fn secs_until_expiry(&self, duration_secs: u64, now: Timestamp) -> u64 {
        self.0
            .saturating_add(duration_secs)
            .saturating_add(1)
            .saturating_sub(now.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_holds_through_its_last_second() {
        let created = Timestamp::new(1_000);
        assert!(!created.has_expired(60, Timestamp::new(1_059)));
        assert!(!created.has_expired(60, Timestamp::new(1_060)));
        assert!(created.has_expired(60, Timestamp::new(1_061)));
    }

    #[test]
    fn secs_until_expiry_counts_down_to_zero() {
        let created = Timestamp::new(1_000);
        assert_eq!(created.secs_until_expiry(60, Timestamp::new(1_000)), 61);
        assert_eq!(created.secs_until_expiry(60, Timestamp::new(1_060)), 1);
        assert_eq!(created.secs_until_expiry(60, Timestamp::new(1_061)), 0);
    }
}
