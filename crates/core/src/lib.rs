//! Core types and utilities for the token aggregator
//!
//! This crate provides shared types used across all components:
//! - Token record and provider source definitions
//! - Filter, sort and pagination types
//! - Fetch, cache and service configurations
//! - Error types

pub mod types;
pub mod tokens;
pub mod filter;
pub mod config;
pub mod errors;

pub use types::*;
pub use tokens::*;
pub use filter::*;
pub use config::*;
pub use errors::*;
