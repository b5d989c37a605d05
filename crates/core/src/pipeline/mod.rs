pub mod dispatch_loop;
pub mod frame_pipeline;
pub mod pipeline_config;
pub mod pipeline_logger;
pub mod pipeline_state;
pub mod readiness_gate;
pub mod telemetry_throttle;

#[cfg(test)]
pub(crate) mod test_support;
