use thiserror::Error;

/// A result type for Bayesian optimization errors
pub type Result<T> = std::result::Result<T, BoError>;

/// An error for sequential Bayesian optimization
#[derive(Error, Debug)]
pub enum BoError {
    /// When configuration is invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfigError(String),
    /// When arrays exchanged with the acquisition or the objectives have unexpected shapes
    #[error("Shape error: {0}")]
    ShapeError(String),
    /// When an expensive objective fails
    #[error("Objective evaluation error: {0}")]
    EvaluationError(anyhow::Error),
    /// When the acquisition cannot be evaluated or optimized
    #[error("Infill error: {0}")]
    InfillError(String),
    /// When surrogate training or prediction fails
    #[error("GP error")]
    GpError(#[from] seqbo_gp::GpError),
    /// When IO fails
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    /// When numpy array write fails
    #[error("IO error")]
    WriteNpyError(#[from] ndarray_npy::WriteNpyError),
    /// When json serialization fails
    #[error("Json error: {0}")]
    JsonError(#[from] serde_json::Error),
}
