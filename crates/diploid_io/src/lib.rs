//! # Diploid IO
//!
//! Persistence layer for sweep results.
//!
//! This crate provides:
//! - Structured error handling with custom error types
//! - JSON encoding and atomic file writes
//! - rkyv and gzip-JSON artifact encodings
//! - A store that keeps one artifact per rule number

/// Error types and result aliases for I/O operations
pub mod error;
/// Atomic writers and readers for rkyv and gzip-JSON files
pub mod persistence;
/// JSON helpers
pub mod serialization;
/// Artifacts keyed by rule number
pub mod store;

pub use error::{IoError, Result};
pub use serialization::{from_json_slice, to_json_pretty, write_json};
pub use store::{load_sweep, validate_sweep, ResultStore};
