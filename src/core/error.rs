use thiserror::Error;

/// Errors raised by the clustering pipeline.
///
/// None of these are expected at runtime: they signal bad configuration or
/// a bug, and callers surface them as a generic failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClusteringError {
    #[error("Invalid parameter {name}: {message}")]
    InvalidParameter {
        name: &'static str,
        message: String,
    },

    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),
}
