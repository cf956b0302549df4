//! Error types for transform math

use thiserror::Error;

/// Errors surfaced by fallible matrix operations.
///
/// A matrix is never modified when an operation returns one of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    /// The matrix has no usable inverse
    #[error("Matrix is not invertible (determinant {0})")]
    Singular(f32),

    /// Projection bounds span zero width, height or depth
    #[error("Degenerate projection: {0}")]
    Degenerate(String),

    /// A parameter is outside its geometric domain or not finite
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, MathError>;
