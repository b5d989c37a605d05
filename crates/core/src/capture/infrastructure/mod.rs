pub mod image_sequence_source;
pub mod synthetic_source;
