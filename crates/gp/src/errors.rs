use thiserror::Error;

/// A result type for Kriging surrogate
pub type Result<T> = std::result::Result<T, GpError>;

/// An error when building or using a [`Kriging`](crate::Kriging) surrogate
#[derive(Error, Debug)]
pub enum GpError {
    /// When likelihood computation fails
    #[error("Likelihood computation error: {0}")]
    LikelihoodComputationError(String),
    /// When linear algebra computation fails
    #[error(transparent)]
    LinalgError(#[from] linfa_linalg::LinalgError),
    /// When training data are not usable
    #[error("Invalid data: {0}")]
    InvalidDataError(String),
    /// When error due to a bad value
    #[error("InvalidValue error: {0}")]
    InvalidValueError(String),
}
