use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;

use livesight_core::capture::domain::capture_error::{startup_failure_message, CaptureSetupError};
use livesight_core::capture::domain::capture_source::CaptureSource;
use livesight_core::capture::infrastructure::image_sequence_source::ImageSequenceSource;
use livesight_core::capture::infrastructure::synthetic_source::SyntheticSource;
use livesight_core::detection::domain::object_detector::ObjectDetector;
use livesight_core::detection::infrastructure::detection_worker::DetectionWorker;
use livesight_core::detection::infrastructure::latency_detector::LatencyDetector;
use livesight_core::detection::infrastructure::luminance_detector::LuminanceDetector;
use livesight_core::pipeline::dispatch_loop::DispatchLoop;
use livesight_core::pipeline::frame_pipeline::FramePipeline;
use livesight_core::pipeline::pipeline_config::PipelineConfig;
use livesight_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use livesight_core::rendering::infrastructure::overlay_surface::OverlaySurface;
use livesight_core::shared::constants::{DEFAULT_CAPTURE_HEIGHT, DEFAULT_CAPTURE_WIDTH};

/// Live frame detection: samples a feed every tick, runs a detector on a
/// worker thread and overlays the results.
#[derive(Parser)]
#[command(name = "livesight")]
struct Cli {
    /// Directory of still images replayed as the live feed. Without it a
    /// synthetic test pattern is used.
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Synthetic feed width.
    #[arg(long, default_value_t = DEFAULT_CAPTURE_WIDTH)]
    width: u32,

    /// Synthetic feed height.
    #[arg(long, default_value_t = DEFAULT_CAPTURE_HEIGHT)]
    height: u32,

    /// How long to run, in seconds.
    #[arg(long, default_value = "5")]
    duration: f64,

    /// JSON config file (defaults to the user config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Dispatch every Nth tick (1 = every tick).
    #[arg(long)]
    frame_skip: Option<u64>,

    /// Minimum score for a detection to be drawn (0.0-1.0).
    #[arg(long)]
    score_threshold: Option<f64>,

    /// Minimum time between rate display updates.
    #[arg(long)]
    rate_interval_ms: Option<f64>,

    /// Tick period.
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Unanswered detect requests allowed before frames are dropped.
    #[arg(long)]
    max_pending: Option<usize>,

    /// Backend hint passed to the detector on init.
    #[arg(long)]
    backend: Option<String>,

    /// Simulated inference time per frame.
    #[arg(long, default_value = "0")]
    inference_latency_ms: u64,

    /// Luma above which a pixel counts as an object.
    #[arg(long, default_value = "200")]
    luminance_threshold: u8,

    /// Start with detection switched off.
    #[arg(long)]
    no_detection: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let run_time = validate(&cli)?;
    let config = load_config(&cli)?;

    let source = open_source(&cli).map_err(|e| startup_failure_message(&e))?;
    let (width, height) = source.dimensions();
    log::info!("Capture source ready ({width}x{height})");

    let worker =
        DetectionWorker::with_max_pending(build_detector(&cli), config.max_pending_detections);
    let mut pipeline = FramePipeline::new(
        config,
        source,
        Box::new(worker),
        Box::new(OverlaySurface::new(width, height)),
        Box::new(StdoutPipelineLogger::new()),
    )?;
    pipeline.mark_capture_ready();
    pipeline.initialize_worker();
    if cli.no_detection {
        pipeline.set_detection_enabled(false);
    }

    let mut dispatch = DispatchLoop::new(pipeline);
    dispatch.start()?;
    std::thread::sleep(run_time);
    let pipeline = dispatch.shutdown()?;

    let counters = pipeline.state().counters;
    log::info!(
        "{} ticks, {} frames dispatched, {} dropped busy, {} capture failures, {} faults",
        pipeline.state().tick_count(),
        counters.dispatched,
        counters.busy_drops,
        counters.capture_failures,
        counters.faults
    );
    pipeline.logger().summary();
    Ok(())
}

fn load_config(cli: &Cli) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::load_or_default()?,
    };
    if let Some(frame_skip) = cli.frame_skip {
        config.frame_skip = frame_skip;
    }
    if let Some(threshold) = cli.score_threshold {
        config.score_threshold = threshold;
    }
    if let Some(interval) = cli.rate_interval_ms {
        config.rate_update_interval_ms = interval;
    }
    if let Some(tick_ms) = cli.tick_ms {
        config.tick_interval_ms = tick_ms;
    }
    if let Some(max_pending) = cli.max_pending {
        config.max_pending_detections = max_pending;
    }
    if cli.backend.is_some() {
        config.backend = cli.backend.clone();
    }
    config.validate()?;
    Ok(config)
}

fn open_source(cli: &Cli) -> Result<Box<dyn CaptureSource>, CaptureSetupError> {
    match &cli.frames {
        Some(dir) => Ok(Box::new(ImageSequenceSource::open(dir)?)),
        None => {
            if cli.width == 0 || cli.height == 0 {
                return Err(CaptureSetupError::InvalidDimensions {
                    width: cli.width,
                    height: cli.height,
                });
            }
            Ok(Box::new(SyntheticSource::new(cli.width, cli.height)))
        }
    }
}

fn build_detector(cli: &Cli) -> Box<dyn ObjectDetector> {
    let base: Box<dyn ObjectDetector> = Box::new(LuminanceDetector::new(cli.luminance_threshold));
    if cli.inference_latency_ms > 0 {
        Box::new(LatencyDetector::new(
            base,
            Duration::from_millis(cli.inference_latency_ms),
        ))
    } else {
        base
    }
}

/// Checks arguments that clap cannot, returning the run time.
fn validate(cli: &Cli) -> Result<Duration, Box<dyn std::error::Error>> {
    match Duration::try_from_secs_f64(cli.duration) {
        Ok(run_time) if !run_time.is_zero() => Ok(run_time),
        _ => Err(format!(
            "Duration must be a positive number of seconds, got {}",
            cli.duration
        )
        .into()),
    }
}
