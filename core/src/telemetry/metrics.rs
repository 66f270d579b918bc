use serde::Serialize;
use std::sync::Mutex;

/// Running counters for the monitor loop.
pub struct MonitorStats {
    inner: Mutex<StatsSnapshot>,
}

/// Point-in-time copy of [`MonitorStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub ticks: u64,
    pub samples: u64,
    pub capture_failures: u64,
    pub alerts: u64,
}

impl MonitorStats {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StatsSnapshot::default()),
        }
    }

    pub fn record_tick(&self) {
        if let Ok(mut stats) = self.inner.lock() {
            stats.ticks += 1;
        }
    }

    pub fn record_sample(&self) {
        if let Ok(mut stats) = self.inner.lock() {
            stats.samples += 1;
        }
    }

    pub fn record_capture_failure(&self) {
        if let Ok(mut stats) = self.inner.lock() {
            stats.capture_failures += 1;
        }
    }

    pub fn record_alert(&self) {
        if let Ok(mut stats) = self.inner.lock() {
            stats.alerts += 1;
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        if let Ok(stats) = self.inner.lock() {
            *stats
        } else {
            StatsSnapshot::default()
        }
    }
}

impl Default for MonitorStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let stats = MonitorStats::new();
        stats.record_tick();
        stats.record_sample();
        stats.record_sample();
        stats.record_capture_failure();
        stats.record_alert();
        assert_eq!(
            stats.snapshot(),
            StatsSnapshot {
                ticks: 1,
                samples: 2,
                capture_failures: 1,
                alerts: 1,
            }
        );
    }
}
