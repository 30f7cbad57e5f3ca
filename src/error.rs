pub type Result<T> = std::result::Result<T, TenChainError>;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TenChainError {
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(&'static str),
    #[error("Decomposition failure: {0}")]
    DecompositionFailure(&'static str),
    #[error("Decomposition failure in LAPACK routine: {0}")]
    Linalg(#[from] ndarray_linalg::error::LinalgError),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Shape error.")]
    ShapeError(#[from] ndarray::ShapeError),
}
