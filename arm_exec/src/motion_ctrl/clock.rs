//! Time sources for the motion controller

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of time which motion can wait on.
pub trait Clock {
    /// Block for the given duration.
    fn sleep(&self, duration: Duration);

    /// Time elapsed since the clock was created.
    fn now(&self) -> Duration;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Wall clock time.
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
}

/// A clock which advances only when slept on.
///
/// Clones share the same time, so a test can keep a handle to a clock given
/// to the controller and read back how long the motion would have taken.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    elapsed_us: Arc<AtomicU64>,
}

/// A shared flag used to cooperatively cancel motion between ticks.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration)
    }

    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for VirtualClock {
    fn sleep(&self, duration: Duration) {
        self.elapsed_us
            .fetch_add(duration.as_micros() as u64, Ordering::SeqCst);
    }

    fn now(&self) -> Duration {
        Duration::from_micros(self.elapsed_us.load(Ordering::SeqCst))
    }
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the motion watching this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clear a previous cancellation.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
