//! Monotonic frame clock
//!
//! [`Clock`] reads a [`TimeSource`] and reports the elapsed time since it was
//! started. Reading the elapsed time also advances the delta reference, so
//! one read per frame gives both values.

use std::time::{Duration, Instant};

/// Anything that can report a monotonically increasing timestamp
pub trait TimeSource {
    /// Time since an arbitrary fixed origin
    fn now(&self) -> Duration;
}

/// Wall clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemTime {
    origin: Instant,
}

impl SystemTime {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTime {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven time source.
///
/// Clones share the same timeline, so a test can keep one handle and advance
/// it while the session owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    now: std::rc::Rc<std::cell::Cell<Duration>>,
}

impl ManualTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, delta: Duration) {
        self.now.set(self.now.get() + delta);
    }

    pub fn advance_secs(&self, secs: f32) {
        self.advance(Duration::from_secs_f32(secs));
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

pub struct Clock<T: TimeSource = SystemTime> {
    source: T,
    start: Duration,
    previous: Duration,
    elapsed: Duration,
}

impl<T: TimeSource> Clock<T> {
    /// Starts the clock at the source's current time
    pub fn new(source: T) -> Self {
        let start = source.now();
        Self {
            source,
            start,
            previous: start,
            elapsed: Duration::ZERO,
        }
    }

    /// Seconds since the clock was started
    pub fn elapsed_time(&mut self) -> f32 {
        self.delta();
        self.elapsed.as_secs_f32()
    }

    /// Seconds since the previous read
    pub fn delta(&mut self) -> f32 {
        let now = self.source.now();
        let delta = now.saturating_sub(self.previous);
        self.previous = now;
        self.elapsed = now.saturating_sub(self.start);
        delta.as_secs_f32()
    }

    pub fn source(&self) -> &T {
        &self.source
    }
}
