//! Time sources used for expiry checks.

use std::fmt::Debug;
use std::sync::{Mutex, PoisonError};
use time::OffsetDateTime;

/// Source of the current wall-clock time.
///
/// The [`Updater`](crate::Updater) asks its clock whenever it decides whether the
/// cached credential is expired. Inject a [`ManualClock`] to make those decisions
/// deterministic in tests.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current time.
    fn now(&self) -> OffsetDateTime;
}

/// Clock backed by the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock whose time only moves when told to.
///
/// ```rust
/// use credential_updater::{Clock, ManualClock};
/// use std::time::Duration;
/// use time::OffsetDateTime;
///
/// let start = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
/// let clock = ManualClock::new(start);
/// clock.advance(Duration::from_secs(31));
/// assert_eq!(clock.now().unix_timestamp(), 1_700_000_031);
/// ```
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<OffsetDateTime>,
}

impl ManualClock {
    /// Creates a clock frozen at `now`.
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Sets the current time.
    pub fn set(&self, now: OffsetDateTime) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    /// Moves the current time forward by `by`.
    pub fn advance(&self, by: std::time::Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
