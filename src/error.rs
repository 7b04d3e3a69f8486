use thiserror::Error;

/// Errors returned by the clustering engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A caller-supplied argument violates a precondition.
    #[error("invalid argument {name}: {message}")]
    InvalidArgument {
        /// Argument name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// Centroids or query points do not match the dimension of the point set.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Dimension of the point set.
        expected: usize,
        /// Dimension that was supplied.
        found: usize,
    },

    /// Some cluster could not be given a member, so its centroid is undefined.
    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
