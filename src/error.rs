use thiserror::Error;

/// Error types for the numopt-rs library.
///
/// Errors are only raised for contract violations detected when a solver is
/// built or a run is started. Numerical trouble met while iterating is
/// reported through [`SolverStatus`](crate::solver::SolverStatus) instead.
#[derive(Error, Debug)]
pub enum OptError {
    /// Error indicating a mismatch in vector or matrix dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error for invalid (non-positive, out of range, non-finite) configuration values.
    #[error("Invalid parameter value: {0}")]
    InvalidParameter(String),

    /// Error for malformed box bounds.
    #[error("Bounds error: {0}")]
    BoundsError(String),

    /// Error indicating an initial population member violates the feasibility predicate.
    #[error("Infeasible population: {0}")]
    InfeasiblePopulation(String),

    /// Invalid input, such as a missing derivative the selected method needs.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error indicating a singular matrix was encountered.
    #[error("Singular matrix encountered")]
    SingularMatrix,

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Generic error for cases that don't fit the other categories.
    #[error("Error: {0}")]
    Other(String),
}

impl OptError {
    /// Returns true for errors raised while validating a solver configuration.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            OptError::DimensionMismatch(_)
                | OptError::InvalidParameter(_)
                | OptError::BoundsError(_)
                | OptError::InfeasiblePopulation(_)
                | OptError::InvalidInput(_)
                | OptError::JsonError(_)
        )
    }
}

/// Result type alias for numopt-rs operations.
pub type Result<T> = std::result::Result<T, OptError>;

/// Extensions for converting from other error types.
impl From<String> for OptError {
    fn from(s: String) -> Self {
        OptError::Other(s)
    }
}

impl From<&str> for OptError {
    fn from(s: &str) -> Self {
        OptError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OptError::DimensionMismatch("expected 3, got 2".to_string());
        assert!(format!("{}", err).contains("expected 3, got 2"));

        let err = OptError::InvalidParameter("swarm size must be at least 2".to_string());
        assert!(format!("{}", err).contains("swarm size"));
    }

    #[test]
    fn test_error_conversion() {
        let json_err = serde_json::from_str::<f64>("not a number").unwrap_err();
        let err: OptError = json_err.into();
        assert!(matches!(err, OptError::JsonError(_)));
        assert!(err.is_configuration_error());

        let str_err: OptError = "test error".into();
        match str_err {
            OptError::Other(s) => assert_eq!(s, "test error"),
            _ => panic!("Expected Other variant"),
        }
        assert!(!OptError::SingularMatrix.is_configuration_error());
    }
}
