//! Tracks the last time a subprocess produced output and the rate at
//! which it has been producing it. The Process Manager consults this on
//! its polling interval to decide whether a running call looks stalled,
//! independent of the call's hard timeout deadline.

use std::time::{Duration, Instant};

/// A point-in-time read of watchdog state, cheap to log or expose via
/// health metrics.
#[derive(Debug, Clone, Copy)]
pub struct WatchdogSnapshot {
    pub idle_for: Duration,
    pub total_bytes: u64,
    pub bytes_per_sec: f64,
}

/// Per-call idle/output-rate tracker. Not thread-safe by itself; callers
/// hold it behind the same task that owns the subprocess's I/O loop.
pub struct OutputWatchdog {
    started_at: Instant,
    last_activity: Instant,
    total_bytes: u64,
}

impl OutputWatchdog {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            started_at: now,
            last_activity: now,
            total_bytes: 0,
        }
    }

    /// Record that `bytes` more output arrived just now.
    pub fn record_activity(&mut self, bytes: usize) {
        self.last_activity = Instant::now();
        self.total_bytes += bytes as u64;
    }

    /// Duration since the last recorded activity.
    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    /// Whether the call has been silent for at least `idle_timeout`.
    pub fn is_idle(&self, idle_timeout: Duration) -> bool {
        self.idle_for() >= idle_timeout
    }

    pub fn snapshot(&self) -> WatchdogSnapshot {
        let elapsed = self.started_at.elapsed().as_secs_f64();
        let bytes_per_sec = if elapsed > 0.0 {
            self.total_bytes as f64 / elapsed
        } else {
            0.0
        };
        WatchdogSnapshot {
            idle_for: self.idle_for(),
            total_bytes: self.total_bytes,
            bytes_per_sec,
        }
    }
}

impl Default for OutputWatchdog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_fresh_watchdog_is_not_idle() {
        let w = OutputWatchdog::new();
        assert!(!w.is_idle(Duration::from_millis(50)));
    }

    #[test]
    fn test_becomes_idle_after_timeout() {
        let w = OutputWatchdog::new();
        sleep(Duration::from_millis(30));
        assert!(w.is_idle(Duration::from_millis(10)));
    }

    #[test]
    fn test_record_activity_resets_idle_timer() {
        let mut w = OutputWatchdog::new();
        sleep(Duration::from_millis(30));
        w.record_activity(128);
        assert!(!w.is_idle(Duration::from_millis(10)));
        assert_eq!(w.snapshot().total_bytes, 128);
    }

    #[test]
    fn test_snapshot_accumulates_bytes() {
        let mut w = OutputWatchdog::new();
        w.record_activity(10);
        w.record_activity(20);
        assert_eq!(w.snapshot().total_bytes, 30);
    }
}
