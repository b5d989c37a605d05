use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting sink for pipeline output that is not the overlay itself:
/// the rate display, counters, status lines and the failure surface.
///
/// Decouples the pipeline from specific output mechanisms (stdout, a GUI
/// label, the log crate) so each front end can observe it without changing
/// the tick code.
pub trait PipelineLogger: Send {
    /// Publish a formatted processing rate (frames per second).
    fn rate(&mut self, formatted: &str);

    /// Record a point-in-time metric (e.g. detections per result).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Present a user-visible failure message.
    fn failure(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn rate(&mut self, _formatted: &str) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
    fn failure(&mut self, _message: &str) {}
}

/// Running aggregate of one metric. Constant size however long the run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricStats {
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
}

impl MetricStats {
    fn new(value: f64) -> Self {
        Self {
            count: 1,
            sum: value,
            min: value,
            max: value,
        }
    }

    fn record(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// CLI-oriented logger: forwards to the `log` crate, aggregates metrics,
/// keeps the latest rate and failure, and reports a summary at the end of
/// the run.
pub struct StdoutPipelineLogger {
    metrics: HashMap<String, MetricStats>,
    start_time: Instant,
    rate_updates: usize,
    last_rate: Option<String>,
    failure_count: usize,
    last_failure: Option<String>,
}

impl StdoutPipelineLogger {
    pub fn new() -> Self {
        Self {
            metrics: HashMap::new(),
            start_time: Instant::now(),
            rate_updates: 0,
            last_rate: None,
            failure_count: 0,
            last_failure: None,
        }
    }

    pub fn last_rate(&self) -> Option<&str> {
        self.last_rate.as_deref()
    }

    pub fn rate_updates(&self) -> usize {
        self.rate_updates
    }

    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    pub fn failure_count(&self) -> usize {
        self.failure_count
    }

    /// Aggregate for a given metric name.
    pub fn metrics_for(&self, name: &str) -> Option<&MetricStats> {
        self.metrics.get(name)
    }

    /// Returns the formatted summary string, or `None` if nothing was
    /// recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.metrics.is_empty() && self.rate_updates == 0 && self.failure_count == 0 {
            return None;
        }

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!("Pipeline summary ({elapsed:.1}s):")];

        if let Some(rate) = &self.last_rate {
            lines.push(format!(
                "  Rate: {rate} fps (last of {} updates)",
                self.rate_updates
            ));
        }

        let mut names: Vec<_> = self.metrics.keys().collect();
        names.sort();
        for name in names {
            let stats = &self.metrics[name];
            lines.push(format!(
                "  {name:12}: count {:6}  avg {:.1}  min {:.1}  max {:.1}",
                stats.count,
                stats.mean(),
                stats.min,
                stats.max
            ));
        }

        if let Some(failure) = self.last_failure() {
            lines.push(format!(
                "  Last failure: {failure} ({} total)",
                self.failure_count
            ));
        }

        Some(lines.join("\n"))
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn rate(&mut self, formatted: &str) {
        self.rate_updates += 1;
        self.last_rate = Some(formatted.to_string());
        log::info!("Rate: {formatted} fps");
    }

    fn metric(&mut self, name: &str, value: f64) {
        match self.metrics.get_mut(name) {
            Some(stats) => stats.record(value),
            None => {
                self.metrics.insert(name.to_string(), MetricStats::new(value));
            }
        }
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn failure(&mut self, message: &str) {
        self.failure_count += 1;
        self.last_failure = Some(message.to_string());
        log::error!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
