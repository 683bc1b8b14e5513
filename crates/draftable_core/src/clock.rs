//! Wall-clock sources for publication checks.
//!
//! # Responsibility
//! - Provide the single `now()` seam used by predicates and queries.
//! - Allow deterministic substitution in tests.
//!
//! # Invariants
//! - Every clock returns UTC timestamps truncated to millisecond precision.
//! - Publication state is never cached; callers read the clock per evaluation.

use crate::timestamp::{normalize, Timestamp};
use chrono::{Duration, Utc};
use std::cell::Cell;

/// Source of the current timestamp.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Clock backed by the operating system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        normalize(Utc::now())
    }
}

/// Manually driven clock for deterministic tests and replays.
///
/// Interior mutability keeps `advance` usable through shared references, so a
/// service holding `&FixedClock` can observe time moving forward.
#[derive(Debug, Clone)]
pub struct FixedClock {
    current: Cell<Timestamp>,
}

impl FixedClock {
    pub fn new(at: Timestamp) -> Self {
        Self {
            current: Cell::new(normalize(at)),
        }
    }

    /// Moves the clock to an absolute instant.
    pub fn set(&self, at: Timestamp) {
        self.current.set(normalize(at));
    }

    /// Moves the clock forward (or backward for negative durations).
    pub fn advance(&self, by: Duration) {
        self.current.set(normalize(self.current.get() + by));
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.current.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}
