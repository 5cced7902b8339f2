//! Configuration validation
//!
//! Rejects run configurations that would fail or misbehave mid-training.

mod error;
mod validator;

#[cfg(test)]
mod proptests;

pub use error::ValidationError;
pub use validator::validate_config;
