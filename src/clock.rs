//! Time, as the engine sees it.

use std::thread;
use std::time::{Duration, Instant};

/// Where the engine gets the current time and how it waits.
pub trait Clock {
    /// The current instant.
    fn now(&self) -> Instant;

    /// Block the calling thread for about `duration`.
    fn sleep(&mut self, duration: Duration);
}

/// The real monotonic clock and a blocking `thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;

    /// A clock that only moves when somebody sleeps on it.
    #[derive(Debug)]
    pub struct FakeClock {
        now: Instant,
        /// Extra time that passes on every sleep, to simulate a slow host.
        pub lag: Duration,
        /// Number of times `sleep` was called.
        pub sleeps: usize,
    }

    impl FakeClock {
        pub fn new() -> FakeClock {
            FakeClock {
                now: Instant::now(),
                lag: Duration::from_secs(0),
                sleeps: 0,
            }
        }

        pub fn advance(&mut self, duration: Duration) {
            self.now += duration;
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            self.now
        }

        fn sleep(&mut self, duration: Duration) {
            self.sleeps += 1;
            self.now += duration + self.lag;
        }
    }
}
