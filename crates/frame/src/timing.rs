use serde::Serialize;
use std::time::Duration;

/// Default number of frame deltas kept by [`FrameTimer`].
pub const DEFAULT_HISTORY: usize = 120;

/// Ring buffer of recent frame deltas.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    history: Vec<Duration>,
    index: usize,
    filled: bool,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: vec![Duration::ZERO; capacity.max(1)],
            index: 0,
            filled: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.history.len()
    }

    pub fn record(&mut self, dt: Duration) {
        self.history[self.index] = dt;
        self.index = (self.index + 1) % self.history.len();
        if self.index == 0 {
            self.filled = true;
        }
    }

    fn window(&self) -> &[Duration] {
        let count = if self.filled {
            self.history.len()
        } else {
            self.index
        };
        &self.history[..count]
    }

    pub fn count(&self) -> usize {
        self.window().len()
    }

    pub fn average(&self) -> Duration {
        let window = self.window();
        if window.is_empty() {
            return Duration::ZERO;
        }
        window
            .iter()
            .fold(Duration::ZERO, |sum, dt| sum.saturating_add(*dt))
            / window.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.window().iter().copied().max().unwrap_or(Duration::ZERO)
    }

    pub fn min(&self) -> Duration {
        self.window().iter().copied().min().unwrap_or(Duration::ZERO)
    }

    pub fn stats(&self, frames: u64, elapsed: f64) -> FrameStats {
        let average = self.average();
        FrameStats {
            frames,
            elapsed,
            samples: self.count(),
            average_ms: average.as_secs_f64() * 1000.0,
            min_ms: self.min().as_secs_f64() * 1000.0,
            max_ms: self.max().as_secs_f64() * 1000.0,
            fps: if average.is_zero() {
                0.0
            } else {
                1.0 / average.as_secs_f64()
            },
        }
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY)
    }
}

/// Snapshot of frame-loop timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameStats {
    pub frames: u64,
    pub elapsed: f64,
    pub samples: usize,
    pub average_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub fps: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_timer_reports_zero() {
        let t = FrameTimer::new(4);
        assert_eq!(t.count(), 0);
        assert_eq!(t.average(), Duration::ZERO);
        assert_eq!(t.stats(0, 0.0).fps, 0.0);
    }

    #[test]
    fn ring_buffer_keeps_latest_window() {
        let mut t = FrameTimer::new(3);
        for ms in [10, 20, 30, 40] {
            t.record(Duration::from_millis(ms));
        }
        assert_eq!(t.count(), 3);
        assert_eq!(t.min(), Duration::from_millis(20));
        assert_eq!(t.max(), Duration::from_millis(40));
        assert_eq!(t.average(), Duration::from_millis(30));
    }

    #[test]
    fn average_saturates_on_huge_samples() {
        let mut t = FrameTimer::new(4);
        t.record(Duration::MAX);
        t.record(Duration::MAX);
        assert_eq!(t.average(), Duration::MAX / 2);
        assert!(t.stats(2, 0.0).fps > 0.0);
    }

    #[test]
    fn stats_serialize_as_json() {
        let mut t = FrameTimer::new(2);
        t.record(Duration::from_millis(16));
        let stats = t.stats(1, 0.016);
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["frames"], 1);
        assert!((json["average_ms"].as_f64().unwrap() - 16.0).abs() < 1e-9);
    }
}
