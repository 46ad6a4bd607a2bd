use thiserror::Error;

/// Error types for the tabfit library.
#[derive(Error, Debug)]
pub enum TabFitError {
    /// Invalid input data, rejected before any solver work.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The external solver terminated without satisfying its tolerance criteria.
    #[error("Solver failed to converge: {0}")]
    ConvergenceFailure(String),

    /// A value outside the domain of a transform (e.g. log of a non-positive value).
    #[error("Domain error: {0}")]
    DomainError(String),

    /// Error indicating a mismatch in array dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error for parameter-related problems.
    #[error("Parameter error: {0}")]
    ParameterError(String),

    /// Error during computational operations.
    #[error("Computation error: {0}")]
    ComputationError(String),

    /// Error during function evaluation.
    #[error("Function evaluation error: {0}")]
    FunctionEvaluation(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<crate::parameters::parameter::ParameterError> for TabFitError {
    fn from(err: crate::parameters::parameter::ParameterError) -> Self {
        TabFitError::ParameterError(format!("{}", err))
    }
}

impl From<crate::parameters::bounds::BoundsError> for TabFitError {
    fn from(err: crate::parameters::bounds::BoundsError) -> Self {
        TabFitError::ParameterError(format!("{}", err))
    }
}

/// Result type alias for tabfit operations.
pub type Result<T> = std::result::Result<T, TabFitError>;
