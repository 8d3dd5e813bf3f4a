//! Clock sources for the stack's bounded wait loops.
//!
//! Every "wait for a reply" in the network core is a poll loop: attempt one
//! non-blocking receive, and if nothing matched, wait a fixed interval, up to
//! a fixed number of attempts. The waiting goes through the [`Clock`] trait so
//! the kernel can plug in its hardware timer and tests can run in virtual time.
//!
//! ## Provided Clocks
//!
//! | Clock          | Waits by              | `now_us()` reports            |
//! |----------------|-----------------------|-------------------------------|
//! | [`SpinClock`]  | busy-wait spin loop   | accumulated delay (virtual)   |
//! | [`ManualClock`]| nothing, returns      | accumulated delay (virtual)   |
//!
//! A kernel with a free-running counter should implement [`Clock`] directly on
//! top of it.

use core::hint;

/// Time source used to pace poll loops and measure round trips
pub trait Clock {
    /// Current timestamp in microseconds (monotonic, arbitrary epoch)
    fn now_us(&self) -> u64;

    /// Delay execution for the specified number of microseconds.
    fn delay_us(&mut self, microseconds: u64);

    /// Delay execution for the specified number of milliseconds.
    ///
    /// This is a convenience wrapper around [`delay_us()`](Self::delay_us).
    #[inline]
    fn delay_ms(&mut self, milliseconds: u64) {
        self.delay_us(milliseconds.saturating_mul(1000));
    }
}

/// Busy-wait clock for kernels without a calibrated timer.
///
/// Spins `spins_per_us` iterations per requested microsecond. Time reported by
/// `now_us()` is the sum of all delays, not wall-clock time.
pub struct SpinClock {
    spins_per_us: u32,
    elapsed_us: u64,
}

impl SpinClock {
    /// Default calibration: one spin-loop hint per microsecond
    pub const DEFAULT_SPINS_PER_US: u32 = 1;

    pub const fn new() -> Self {
        Self::with_calibration(Self::DEFAULT_SPINS_PER_US)
    }

    pub const fn with_calibration(spins_per_us: u32) -> Self {
        Self {
            spins_per_us,
            elapsed_us: 0,
        }
    }
}

impl Default for SpinClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SpinClock {
    fn now_us(&self) -> u64 {
        self.elapsed_us
    }

    fn delay_us(&mut self, microseconds: u64) {
        let spins = microseconds.saturating_mul(self.spins_per_us as u64);
        for _ in 0..spins {
            hint::spin_loop();
        }
        self.elapsed_us = self.elapsed_us.saturating_add(microseconds);
    }
}

/// Clock that only advances when asked to delay.
///
/// Makes poll loops deterministic: a budget of N attempts always reports
/// exactly N delays and N x interval microseconds.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    now_us: u64,
    delays: u32,
}

impl ManualClock {
    pub const fn new() -> Self {
        Self {
            now_us: 0,
            delays: 0,
        }
    }

    /// Number of `delay_us()` calls so far
    pub fn delay_count(&self) -> u32 {
        self.delays
    }

    /// Move time forward without counting a delay
    pub fn advance(&mut self, microseconds: u64) {
        self.now_us = self.now_us.saturating_add(microseconds);
    }
}

impl Clock for ManualClock {
    fn now_us(&self) -> u64 {
        self.now_us
    }

    fn delay_us(&mut self, microseconds: u64) {
        self.delays += 1;
        self.advance(microseconds);
    }
}

/// Bounded poll: at most `attempts` tries with `interval_us` of waiting after
/// each unsuccessful one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget {
    pub attempts: u32,
    pub interval_us: u64,
}

impl PollBudget {
    pub const fn new(attempts: u32, interval_us: u64) -> Self {
        Self {
            attempts,
            interval_us,
        }
    }

    /// Longest time the whole poll can take
    pub const fn total_us(&self) -> u64 {
        (self.attempts as u64).saturating_mul(self.interval_us)
    }
}

/// Run `attempt` until it yields a value or the budget is spent.
///
/// `attempt` receives the zero-based attempt number. A successful attempt
/// returns immediately without waiting.
pub fn poll<T, F>(clock: &mut dyn Clock, budget: PollBudget, mut attempt: F) -> Option<T>
where
    F: FnMut(u32) -> Option<T>,
{
    for n in 0..budget.attempts {
        if let Some(value) = attempt(n) {
            return Some(value);
        }
        clock.delay_us(budget.interval_us);
    }
    None
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_us_saturates() {
        assert_eq!(PollBudget::new(100, 100_000).total_us(), 10_000_000);
        assert_eq!(PollBudget::new(2, u64::MAX).total_us(), u64::MAX);
    }

    #[test]
    fn test_manual_clock_advances_on_delay() {
        let mut clock = ManualClock::new();
        clock.delay_us(250);
        clock.delay_ms(2);
        assert_eq!(clock.now_us(), 2250);
        assert_eq!(clock.delay_count(), 2);
    }

    #[test]
    fn test_spin_clock_accumulates() {
        let mut clock = SpinClock::with_calibration(0);
        clock.delay_us(1_000);
        clock.delay_ms(5);
        assert_eq!(clock.now_us(), 6_000);
    }

    #[test]
    fn test_poll_exhausts_budget() {
        let mut clock = ManualClock::new();
        let budget = PollBudget::new(100, 100_000);
        let mut tries = 0;

        let result: Option<()> = poll(&mut clock, budget, |_| {
            tries += 1;
            None
        });

        assert!(result.is_none());
        assert_eq!(tries, 100);
        assert_eq!(clock.delay_count(), 100);
        assert_eq!(clock.now_us(), budget.total_us());
        assert_eq!(budget.total_us(), 10_000_000);
    }

    #[test]
    fn test_poll_stops_on_success_without_waiting() {
        let mut clock = ManualClock::new();
        let result = poll(&mut clock, PollBudget::new(10, 1_000), |n| {
            (n == 3).then_some(n)
        });

        assert_eq!(result, Some(3));
        // Three failed attempts, three waits; the fourth succeeds immediately
        assert_eq!(clock.delay_count(), 3);
    }
}
