pub mod format;

pub use format::{detect_output_mode, OutputMode};
