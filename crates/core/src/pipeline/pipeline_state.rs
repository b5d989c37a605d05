use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::readiness_gate::ReadinessGate;
use crate::pipeline::telemetry_throttle::TelemetryThrottle;

/// Per-run tallies of what the dispatch step did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchCounters {
    pub dispatched: u64,
    pub busy_drops: u64,
    pub capture_failures: u64,
    pub faults: u64,
}

/// The one piece of mutable pipeline state.
///
/// Constructed with the pipeline and owned by it; only the tick and the
/// worker-event handler touch it, and both run on the loop's thread.
#[derive(Clone, Debug)]
pub struct PipelineState {
    pub gate: ReadinessGate,
    tick_count: u64,
    telemetry: TelemetryThrottle,
    pub counters: DispatchCounters,
}

impl PipelineState {
    pub fn new(rate_update_interval_ms: f64) -> Self {
        Self {
            gate: ReadinessGate::new(),
            tick_count: 0,
            telemetry: TelemetryThrottle::new(rate_update_interval_ms),
            counters: DispatchCounters::default(),
        }
    }

    /// Ticks completed so far. Monotonic, one per tick.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn telemetry(&self) -> &TelemetryThrottle {
        &self.telemetry
    }

    /// Closes out a tick: bumps the counter and feeds telemetry.
    pub fn complete_tick(&mut self, now_ms: f64, sink: &mut dyn PipelineLogger) {
        self.tick_count += 1;
        self.telemetry.observe(now_ms, sink);
    }
}
