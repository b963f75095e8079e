use chrono::{DateTime, Utc};
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Time source for session telemetry.
///
/// `monotonic` only ever moves forward and is used for inter-event deltas.
/// `wall` is calendar time and is used for session length and timestamps.
pub trait Clock {
    fn monotonic(&self) -> Duration;
    fn wall(&self) -> DateTime<Utc>;
}

/// Production clock backed by `Instant` and the system calendar
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn monotonic(&self) -> Duration {
        self.origin.elapsed()
    }

    fn wall(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock for tests. Clones share the same readings.
#[derive(Debug, Clone)]
pub struct ManualClock {
    mono: Rc<Cell<Duration>>,
    wall: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            mono: Rc::new(Cell::new(Duration::ZERO)),
            wall: Rc::new(Cell::new(start)),
        }
    }

    /// Move both readings forward
    pub fn advance(&self, by: Duration) {
        self.mono.set(self.mono.get() + by);
        let step = chrono::Duration::from_std(by).unwrap_or_else(|_| chrono::Duration::zero());
        self.wall.set(self.wall.get() + step);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Simulate a wall clock adjustment; the monotonic reading is untouched
    pub fn set_wall_back(&self, by: Duration) {
        let step = chrono::Duration::from_std(by).unwrap_or_else(|_| chrono::Duration::zero());
        self.wall.set(self.wall.get() - step);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl Clock for ManualClock {
    fn monotonic(&self) -> Duration {
        self.mono.get()
    }

    fn wall(&self) -> DateTime<Utc> {
        self.wall.get()
    }
}
