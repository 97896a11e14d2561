//! Core Components
//!
//! HTTP transport shared by token exchanges and data queries.

pub mod transport;

pub use transport::*;
