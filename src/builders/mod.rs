//! Builders
//!
//! Fluent builder for target configuration.

pub mod config;

pub use config::{target_config, TargetConfigBuilder};
