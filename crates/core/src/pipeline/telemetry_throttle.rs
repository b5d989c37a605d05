use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::constants::DEFAULT_RATE_UPDATE_INTERVAL_MS;

/// Computes the instantaneous tick rate on every tick and publishes it at
/// most once per interval.
///
/// Timestamps are milliseconds on a monotonic clock.
#[derive(Clone, Debug, PartialEq)]
pub struct TelemetryThrottle {
    interval_ms: f64,
    last_tick_timestamp: Option<f64>,
    last_published_rate_timestamp: f64,
}

impl TelemetryThrottle {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            last_tick_timestamp: None,
            last_published_rate_timestamp: 0.0,
        }
    }

    /// Returns the rate computed for this tick, whether or not it was
    /// published. The first call only seeds the clock.
    pub fn observe(&mut self, now_ms: f64, sink: &mut dyn PipelineLogger) -> Option<f64> {
        let last = self.last_tick_timestamp.replace(now_ms)?;
        let delta = now_ms - last;
        if delta <= 0.0 {
            return None;
        }
        let rate = 1000.0 / delta;

        if now_ms - self.last_published_rate_timestamp > self.interval_ms {
            sink.rate(&format_rate(rate));
            self.last_published_rate_timestamp = now_ms;
        }
        Some(rate)
    }

    pub fn last_tick_timestamp(&self) -> Option<f64> {
        self.last_tick_timestamp
    }

    pub fn last_published_rate_timestamp(&self) -> f64 {
        self.last_published_rate_timestamp
    }
}

impl Default for TelemetryThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_UPDATE_INTERVAL_MS)
    }
}

/// One decimal place, as shown on the rate display.
pub fn format_rate(rate: f64) -> String {
    format!("{rate:.1}")
}
