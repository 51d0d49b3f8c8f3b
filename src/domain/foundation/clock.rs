//! Time source abstraction.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use super::Timestamp;

/// Source of the current time.
///
/// Stateful calculators take a clock instead of calling `Timestamp::now()`
/// so that elapsed-time results can be asserted exactly.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Clock that only moves when told to.
///
/// Clones share the same instant, so a test can keep one handle and
/// advance the clock owned by the code under test.
#[derive(Debug, Clone)]
pub struct ManualClock {
    unix_millis: Arc<AtomicI64>,
}

impl ManualClock {
    /// Starts the clock at the given timestamp.
    pub fn starting_at(start: Timestamp) -> Self {
        Self {
            unix_millis: Arc::new(AtomicI64::new(start.as_datetime().timestamp_millis())),
        }
    }

    /// Moves the clock forward (or backward, for negative values).
    pub fn advance_millis(&self, millis: i64) {
        self.unix_millis.fetch_add(millis, Ordering::SeqCst);
    }

    /// Moves the clock forward by whole seconds.
    pub fn advance_secs(&self, secs: i64) {
        self.advance_millis(secs * 1000);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_unix_millis(self.unix_millis.load(Ordering::SeqCst))
    }
}
