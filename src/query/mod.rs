//! Query execution against the data endpoints.

pub mod executor;

pub use executor::{JsonSource, QueryExecutor};
