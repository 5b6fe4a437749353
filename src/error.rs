//! Error types for the ESN forecasting library

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, EsnError>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum EsnError {
    /// Invalid or incomplete run configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Series data missing, empty or malformed
    #[error("Data error: {0}")]
    Data(String),

    /// Washout and forecast horizon do not fit inside a trial
    #[error(
        "Invalid trial layout: trial length {trial_length}, washout {washout}, steps {steps}"
    )]
    InvalidTrialLayout {
        trial_length: usize,
        washout: usize,
        steps: usize,
    },

    /// Series length is not a whole number of trials
    #[error("Series of length {len} is not a multiple of trial length {trial_length}")]
    PartialTrial { len: usize, trial_length: usize },

    /// Shapes of two operands disagree
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Eigen-decomposition of the recurrent matrix failed
    #[error("Eigen-decomposition failed: {0}")]
    Eigen(String),

    /// Readout normal equations could not be solved
    #[error("Singular readout system (regularization {regularization})")]
    SingularSystem { regularization: f64 },

    /// Readout requested before it was trained
    #[error("Readout not trained yet")]
    NotTrained,

    /// Grid search produced no usable candidate
    #[error("No candidate model could be trained")]
    NoCandidate,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Model (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

impl EsnError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a data error
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    /// Numerical failures are local to one restart or combination; the
    /// grid search skips them instead of aborting the run.
    pub fn is_numerical(&self) -> bool {
        matches!(self, Self::Eigen(_) | Self::SingularSystem { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EsnError::config("no leaking rates specified");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: no leaking rates specified"
        );

        let err = EsnError::InvalidTrialLayout {
            trial_length: 10,
            washout: 8,
            steps: 2,
        };
        assert!(err.to_string().contains("washout 8"));
    }

    #[test]
    fn test_numerical_classification() {
        assert!(EsnError::SingularSystem { regularization: 0.0 }.is_numerical());
        assert!(EsnError::Eigen("no convergence".into()).is_numerical());
        assert!(!EsnError::NoCandidate.is_numerical());
        assert!(!EsnError::data("empty").is_numerical());
    }
}
