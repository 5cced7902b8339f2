//! Command-line arguments

mod core;


pub use self::core::{apply_overrides, parse_args, parse_class_count, Cli};
