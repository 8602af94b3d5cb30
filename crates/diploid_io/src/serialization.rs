//! JSON encoding shared by the gzip store and the inspection tool.
//!
//! Empty input is reported as a validation error rather than a parse error,
//! so a truncated artifact and a malformed one can be told apart.

use crate::error::{IoError, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Pretty-printed JSON, for humans.
pub fn to_json_pretty<T>(data: &T) -> Result<String>
where
    T: Serialize,
{
    serde_json::to_string_pretty(data)
        .map_err(|e| IoError::serialization(format!("JSON serialization failed: {}", e)))
}

/// Streams compact JSON into `writer`.
pub fn write_json<T, W>(writer: W, data: &T) -> Result<()>
where
    T: Serialize,
    W: Write,
{
    serde_json::to_writer(writer, data)
        .map_err(|e| IoError::serialization(format!("JSON serialization failed: {}", e)))
}

pub fn from_json_slice<T>(bytes: &[u8]) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(IoError::validation("Empty JSON document"));
    }
    serde_json::from_slice(bytes)
        .map_err(|e| IoError::serialization(format!("JSON deserialization failed: {}", e)))
}
