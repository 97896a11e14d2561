//! Veeam Query Types
//!
//! Core type definitions for configuration, tokens and requests.

pub mod config;
pub mod probe;
pub mod query;
pub mod token;

pub use config::*;
pub use probe::*;
pub use query::*;
pub use token::*;
