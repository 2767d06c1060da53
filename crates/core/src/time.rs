//! Clock injection for the session engine.
//!
//! Session timestamps (start, target end, per-question think time) all flow
//! through a [`Clock`] handed to the engine, so tests can pin "now" and step
//! it between answers.

use chrono::{DateTime, Duration, Utc};

/// Source of "now" for session timestamps.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    /// Real system time.
    #[default]
    Default,
    /// Pinned time, stepped manually via [`Clock::advance`].
    Fixed(DateTime<Utc>),
}

impl Clock {
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Step a fixed clock forward; real clocks are unaffected.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }
}

/// Whole milliseconds between `start` and `now`, clamped to `0..=u32::MAX`.
///
/// Answer-time measurements are stored as `u32` milliseconds; a clock that
/// moved backwards reads as zero rather than going negative.
#[must_use]
pub fn clamped_elapsed_ms(start: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    u32::try_from((now - start).num_milliseconds().max(0)).unwrap_or(u32::MAX)
}

/// Deterministic timestamp for tests (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` pinned at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
