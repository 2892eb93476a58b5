use std::cell::Cell;

use chrono::{Duration, Local, NaiveDateTime};

/// Source of "now" for checkpoint names and log timestamps.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Wall-clock local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock that starts at a fixed instant and advances by `step` on every read.
///
/// Gives each checkpoint a distinct, predictable timestamp.
#[derive(Debug)]
pub struct SteppingClock {
    next: Cell<NaiveDateTime>,
    step: Duration,
}

impl SteppingClock {
    pub fn new(start: NaiveDateTime, step: Duration) -> Self {
        Self {
            next: Cell::new(start),
            step,
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> NaiveDateTime {
        let now = self.next.get();
        self.next.set(now + self.step);
        now
    }
}
