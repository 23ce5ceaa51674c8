use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;
use std::time::Instant;

use chrono::Utc;

/// Source of the two clocks used by the caches
///
/// Token claims (`exp`, `nbf`) are compared against wall-clock seconds, while
/// key set deadlines are computed from a monotonic clock so that they are not
/// affected by adjustments of the system time.
pub trait TimeSource: Send + Sync {
    /// Current wall-clock time as seconds since the Unix epoch
    fn now_seconds(&self) -> i64;

    /// Current monotonic time
    fn monotonic_now(&self) -> Instant;
}

/// Time source backed by the system clocks
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_seconds(&self) -> i64 {
        Utc::now().timestamp()
    }

    fn monotonic_now(&self) -> Instant {
        Instant::now()
    }
}

struct ManualState {
    base_seconds: i64,
    elapsed: Duration,
}

impl ManualState {
    fn elapsed_seconds(&self) -> i64 {
        i64::try_from(self.elapsed.as_secs()).unwrap_or(i64::MAX)
    }
}

/// Controllable time source
///
/// Both clocks only move when [`ManualTimeSource::advance`] or
/// [`ManualTimeSource::set_seconds`] is called, which makes expiration
/// behaviour deterministic in tests.
pub struct ManualTimeSource {
    origin: Instant,
    state: Mutex<ManualState>,
}

impl ManualTimeSource {
    /// Create a time source whose wall clock starts at `seconds` since the epoch
    pub fn new(seconds: i64) -> Self {
        Self {
            origin: Instant::now(),
            state: Mutex::new(ManualState {
                base_seconds: seconds,
                elapsed: Duration::ZERO,
            }),
        }
    }

    /// Advance both the wall clock and the monotonic clock
    ///
    /// The monotonic clock saturates at the latest `Instant` the platform can
    /// represent instead of overflowing.
    pub fn advance(&self, by: Duration) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let mut remaining = by;
        let mut step = by;
        while !remaining.is_zero() && !step.is_zero() {
            step = step.min(remaining);
            match state
                .elapsed
                .checked_add(step)
                .filter(|elapsed| self.origin.checked_add(*elapsed).is_some())
            {
                Some(elapsed) => {
                    state.elapsed = elapsed;
                    remaining -= step;
                }
                None => step /= 2,
            }
        }
    }

    /// Move the wall clock only, e.g. to simulate an NTP adjustment
    pub fn set_seconds(&self, seconds: i64) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.base_seconds = seconds.saturating_sub(state.elapsed_seconds());
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new(Utc::now().timestamp())
    }
}

impl TimeSource for ManualTimeSource {
    fn now_seconds(&self) -> i64 {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.base_seconds.saturating_add(state.elapsed_seconds())
    }

    fn monotonic_now(&self) -> Instant {
        let elapsed = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed;
        self.origin.checked_add(elapsed).unwrap_or(self.origin)
    }
}
