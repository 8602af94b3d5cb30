//! Error types for the simulation core.

use thiserror::Error;

/// Errors raised while building rule tables, stepping rows, or running sweeps.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// Rule number outside `0..=255`. Values are never truncated to their low byte.
    #[error("Invalid rule number {0}: must be in 0..=255")]
    InvalidRule(u32),

    /// A size, step count, lambda or row length violated its precondition.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A single run failed inside the worker pool.
    #[error("Run {index} (lambda = {lambda}) failed: {reason}")]
    WorkerFailure {
        index: usize,
        lambda: f64,
        reason: String,
    },

    /// The worker pool could not be built.
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, SimError>;

impl SimError {
    /// Creates a new invalid parameter error.
    #[must_use]
    pub fn invalid_parameter<S: Into<String>>(msg: S) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Creates a new worker failure for the run at `index`.
    #[must_use]
    pub fn worker_failure<S: Into<String>>(index: usize, lambda: f64, reason: S) -> Self {
        Self::WorkerFailure {
            index,
            lambda,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            SimError::InvalidRule(300).to_string(),
            "Invalid rule number 300: must be in 0..=255"
        );
        let err = SimError::worker_failure(3, 0.15, "boom");
        assert_eq!(err.to_string(), "Run 3 (lambda = 0.15) failed: boom");
    }

    #[test]
    fn test_invalid_parameter_constructor() {
        let err = SimError::invalid_parameter("cells must be at least 1");
        assert!(matches!(err, SimError::InvalidParameter(ref m) if m.contains("cells")));
    }
}
