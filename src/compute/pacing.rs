//! Fixed-rate frame pacing.
//!
//! Deadlines form an exact arithmetic progression from the origin:
//! `deadline(n) = origin + n * 1s / frame_rate`. Each deadline is derived
//! from the tick count rather than accumulated, so late frames never push
//! the schedule back and rounding never compounds. A slow frame is
//! absorbed by sleeping less (or not at all) on the following ones.

use std::time::{Duration, Instant};

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Time source used by the pacer.
pub trait Clock {
    /// Current instant.
    fn now(&self) -> Instant;
    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `Instant` and `thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Result of waiting for one frame slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaceOutcome {
    /// Finished early and slept for the remainder of the slot.
    Slept(Duration),
    /// Already past the deadline by this much; no sleep.
    Overrun(Duration),
}

/// Drift-free frame scheduler.
pub struct Pacer<C: Clock = SystemClock> {
    clock: C,
    origin: Instant,
    frame_rate: u32,
    ticks: u64,
}

impl<C: Clock> Pacer<C> {
    /// Create a pacer whose first slot starts now.
    pub fn new(clock: C, frame_rate: u32) -> Self {
        assert!(frame_rate > 0, "frame rate must be non-zero");
        let origin = clock.now();
        Self {
            clock,
            origin,
            frame_rate,
            ticks: 0,
        }
    }

    /// Move the origin to now and forget completed ticks.
    pub fn restart(&mut self) {
        self.origin = self.clock.now();
        self.ticks = 0;
    }

    /// Offset of the `n`-th deadline from the origin.
    #[inline]
    pub fn offset(&self, n: u64) -> Duration {
        let nanos = n as u128 * NANOS_PER_SEC / self.frame_rate as u128;
        Duration::from_nanos(nanos as u64)
    }

    /// Deadline of the slot currently in progress.
    #[inline]
    pub fn deadline(&self) -> Instant {
        self.origin + self.offset(self.ticks + 1)
    }

    #[inline]
    pub fn origin(&self) -> Instant {
        self.origin
    }

    /// Number of completed slots.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// How far the clock is behind the current deadline (zero when early).
    pub fn lag(&self) -> Duration {
        self.clock.now().saturating_duration_since(self.deadline())
    }

    /// Sleep until the end of the current slot and advance to the next one.
    pub fn wait(&mut self) -> PaceOutcome {
        let deadline = self.deadline();
        let now = self.clock.now();
        self.ticks += 1;

        if now < deadline {
            let remaining = deadline - now;
            self.clock.sleep(remaining);
            PaceOutcome::Slept(remaining)
        } else {
            PaceOutcome::Overrun(now - deadline)
        }
    }
}

#[cfg(test)]
pub(crate) use manual::ManualClock;
