//! Token Management
//!
//! Token cache and the provider that fills it.
//!
//! This module provides:
//!
//! - **Token Cache**: process-wide in-memory store behind a single lock
//! - **Token Provider**: password and refresh grant exchanges

pub mod provider;
pub mod storage;

pub use provider::{DefaultTokenProvider, TokenProvider};
pub use storage::TokenCache;
