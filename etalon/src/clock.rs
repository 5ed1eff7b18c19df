//! Wall clock and sleep, injectable so timed loops can run in tests without
//! real waiting.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Source of the current time plus a way to wait.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    fn sleep(&self, duration: Duration);
}

/// The real clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Clock that only moves when told to.
///
/// `sleep` returns immediately after advancing the clock by the requested
/// duration. Clones share the same time, so a test can hold one handle while a
/// loop under test owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn sleep(&self, duration: Duration) {
        self.advance(TimeDelta::from_std(duration).unwrap_or(TimeDelta::zero()));
    }
}

/// Values collected by [`poll_for`].
#[derive(Debug, Clone, PartialEq)]
pub struct PolledWindow<T> {
    /// Clock reading taken before the first poll
    pub start: DateTime<Utc>,
    pub values: Vec<T>,
}

/// Call `poll` every `interval` for as long as no more than `window` has
/// elapsed since the start.
///
/// The number of values depends on how long each poll takes, so it is not
/// fixed. The first poll always happens. An error from `poll` ends the window
/// immediately.
pub fn poll_for<C, T, E, F>(
    clock: &C,
    window: TimeDelta,
    interval: Duration,
    mut poll: F,
) -> Result<PolledWindow<T>, E>
where
    C: Clock + ?Sized,
    F: FnMut() -> Result<T, E>,
{
    let start = clock.now();
    let mut values = Vec::new();

    while clock.now() - start <= window {
        values.push(poll()?);
        clock.sleep(interval);
    }

    Ok(PolledWindow { start, values })
}
