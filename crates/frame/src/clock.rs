use std::time::Instant;

/// Monotonic source of elapsed seconds.
pub trait Clock {
    /// Seconds since the clock was created. Never negative, never decreasing.
    fn elapsed(&self) -> f64;
}

/// Wall clock backed by [`Instant`], started at construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn elapsed(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Hand-driven clock for headless runs and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualClock {
    now: f64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move forward by `seconds`. Negative or non-finite steps are ignored;
    /// the reading saturates at `f64::MAX`.
    pub fn advance(&mut self, seconds: f64) {
        if seconds.is_finite() && seconds > 0.0 {
            self.now = (self.now + seconds).min(f64::MAX);
        }
    }

    /// Jump to `seconds` if that is later than the current reading.
    pub fn set(&mut self, seconds: f64) {
        if seconds.is_finite() && seconds > self.now {
            self.now = seconds;
        }
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> f64 {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_clock_never_decreases() {
        let clock = MonotonicClock::new();
        let a = clock.elapsed();
        let b = clock.elapsed();
        assert!(a >= 0.0);
        assert!(b >= a);
    }

    #[test]
    fn manual_clock_only_moves_forward() {
        let mut clock = ManualClock::new();
        clock.advance(0.5);
        clock.advance(-1.0);
        clock.advance(f64::NAN);
        assert_eq!(clock.elapsed(), 0.5);

        clock.set(2.0);
        clock.set(1.0);
        assert_eq!(clock.elapsed(), 2.0);
    }

    #[test]
    fn manual_clock_saturates_instead_of_overflowing() {
        let mut clock = ManualClock::new();
        clock.advance(f64::MAX);
        clock.advance(f64::MAX);
        assert!(clock.elapsed().is_finite());
        assert_eq!(clock.elapsed(), f64::MAX);
    }
}
