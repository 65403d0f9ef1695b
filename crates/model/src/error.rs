use thiserror::Error;

/// Errors raised while building or validating model values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// A dimension key outside of `date | query | page | device`.
    #[error("Unknown dimension: {0}")]
    UnknownDimension(String),

    /// A sync target definition violates one of its invariants.
    #[error("Invalid target '{name}': {reason}")]
    InvalidTarget { name: String, reason: String },

    /// A fetched row whose key count does not match the requested dimensions.
    #[error("Expected {expected} dimension keys, got {actual}")]
    KeyMismatch { expected: usize, actual: usize },

    /// The requested dimensions carry no `date`, so rows cannot be dated.
    #[error("Dimension set has no date dimension")]
    MissingDate,

    /// A date cell or key that is not formatted as `YYYY-MM-DD`.
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}
