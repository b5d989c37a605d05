pub mod detection_worker;
pub mod latency_detector;
pub mod luminance_detector;
