//! Run configuration: YAML schema, loading, validation and CLI arguments

mod cli;
mod loader;
mod schema;
pub mod validate;

pub use cli::{apply_overrides, parse_args, parse_class_count, Cli};
pub use loader::load_config;
pub use schema::RunConfig;
pub use validate::{validate_config, ValidationError};
