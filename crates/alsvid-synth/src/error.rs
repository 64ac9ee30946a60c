//! Error types for the synthesis crate.

use alsvid_ir::IrError;
use thiserror::Error;

/// Errors that can occur while preparing targets or running the search.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SynthError {
    /// A target constraint covers no entry at all.
    #[error("target constraint covers no matrix entry")]
    EmptyCover,

    /// Cover mask and target matrix have different shapes.
    #[error("cover shape {cover:?} does not match matrix shape {matrix:?}")]
    CoverShapeMismatch {
        /// Shape of the cover mask.
        cover: (usize, usize),
        /// Shape of the target matrix.
        matrix: (usize, usize),
    },

    /// Target matrix is not square with a power-of-two dimension.
    #[error("target matrix dimension {dim} is not a power of two")]
    InvalidDimension {
        /// The offending dimension.
        dim: usize,
    },

    /// Underlying circuit or library failure.
    #[error(transparent)]
    Ir(#[from] IrError),
}

/// Result type for synthesis operations.
pub type SynthResult<T> = Result<T, SynthError>;
