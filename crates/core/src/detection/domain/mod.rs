pub mod object_detector;
pub mod worker_channel;
pub mod worker_message;
pub mod worker_state;
