use thiserror::Error;

/// Error taxonomy for the vanity search core.
///
/// `Cancelled` is deliberately absent: cancellation is surfaced as a
/// first-class `Option`/return value (see [`crate::pool::WorkerPool::generate_one`]),
/// never as an error variant.
#[derive(Debug, Error)]
pub enum VanityError {
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("crypto failure: {0}")]
    Crypto(String),

    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, VanityError>;
