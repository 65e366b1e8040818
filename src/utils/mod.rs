pub mod size_format;

pub use size_format::{format_size, format_size_with_unit};
