//! Error types for retention experiment analysis
//!
//! Provides a unified error type for all retention-stats crates.

use crate::design::ExperimentDesign;
use thiserror::Error;

/// Core error type for simulation and hypothesis-testing operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid parameter provided to a function
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Input for which the test statistic is undefined
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// Numerical computation error
    #[error("Computation error: {0}")]
    Computation(String),

    /// Threading or parallelization error
    #[error("Execution error: {0}")]
    Execution(String),

    /// An error raised while simulating a specific design
    #[error("{source} (design: {design})")]
    InDesign {
        design: ExperimentDesign,
        #[source]
        source: Box<Error>,
    },

    /// IO error (for file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error for a probability outside [0, 1]
    pub fn invalid_probability(name: &str, p: f64) -> Self {
        Self::InvalidParameter(format!("{name} {p} must be in [0, 1]"))
    }

    /// Create an error for a group whose outcomes are all identical
    pub fn zero_variance(group: &str) -> Self {
        Self::DegenerateInput(format!("{group} sample has zero variance"))
    }

    /// Create an error for a group with too few observations
    pub fn too_few_observations(group: &str, expected: u64, actual: u64) -> Self {
        Self::DegenerateInput(format!(
            "{group} sample needs at least {expected} observations, got {actual}"
        ))
    }

    /// Create an error for NaN/Inf values
    pub fn non_finite(context: &str) -> Self {
        Self::DegenerateInput(format!("{context} is NaN or infinite"))
    }

    /// Attach the design that was being simulated when this error occurred.
    ///
    /// Already-attributed errors are returned unchanged so the innermost
    /// design wins.
    pub fn with_design(self, design: &ExperimentDesign) -> Self {
        match self {
            Self::InDesign { .. } => self,
            other => Self::InDesign {
                design: *design,
                source: Box::new(other),
            },
        }
    }

    /// The underlying error, looking through design context
    pub fn root(&self) -> &Error {
        match self {
            Self::InDesign { source, .. } => source.root(),
            other => other,
        }
    }

    /// The design attached to this error, if any
    pub fn design(&self) -> Option<&ExperimentDesign> {
        match self {
            Self::InDesign { design, .. } => Some(design),
            _ => None,
        }
    }

    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self.root(), Self::InvalidParameter(_))
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self.root(), Self::DegenerateInput(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidParameter("population must be positive".to_string());
        assert_eq!(err.to_string(), "Invalid parameter: population must be positive");

        let err = Error::DegenerateInput("all outcomes identical".to_string());
        assert_eq!(err.to_string(), "Degenerate input: all outcomes identical");

        let err = Error::Computation("bad freedom".to_string());
        assert_eq!(err.to_string(), "Computation error: bad freedom");

        let err = Error::Execution("thread pool exhausted".to_string());
        assert_eq!(err.to_string(), "Execution error: thread pool exhausted");
    }

    #[test]
    fn test_error_helper_functions() {
        let err = Error::invalid_probability("baseline_rate", 1.5);
        assert_eq!(
            err.to_string(),
            "Invalid parameter: baseline_rate 1.5 must be in [0, 1]"
        );

        let err = Error::zero_variance("control");
        assert!(err.is_degenerate());
        assert_eq!(err.to_string(), "Degenerate input: control sample has zero variance");

        let err = Error::too_few_observations("exposed", 2, 1);
        assert!(err.is_degenerate());
        assert!(err.to_string().contains("at least 2 observations, got 1"));

        let err = Error::non_finite("standard error");
        assert!(err.is_degenerate());
    }

    #[test]
    fn test_design_context() {
        let design = ExperimentDesign::new(0.615, 0.02, 200_000, 19.0).unwrap();
        let err = Error::zero_variance("control").with_design(&design);

        assert!(err.is_degenerate());
        assert!(!err.is_invalid_parameter());
        assert_eq!(err.design(), Some(&design));

        let message = err.to_string();
        assert!(message.contains("zero variance"));
        assert!(message.contains("baseline_rate=0.615"));
        assert!(message.contains("population=200000"));
    }

    #[test]
    fn test_design_context_keeps_innermost() {
        let inner = ExperimentDesign::new(0.5, 0.01, 1_000, 4.0).unwrap();
        let outer = ExperimentDesign::new(0.6, 0.02, 2_000, 9.0).unwrap();

        let err = Error::zero_variance("exposed")
            .with_design(&inner)
            .with_design(&outer);

        assert_eq!(err.design(), Some(&inner));
        match err.root() {
            Error::DegenerateInput(_) => {}
            other => panic!("Wrong root error: {other:?}"),
        }
    }

    #[test]
    fn test_error_from_io_error() {
        use std::io;

        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        match err {
            Error::Io(_) => {
                assert!(err.to_string().contains("file not found"));
            }
            _ => panic!("Wrong error type"),
        }
    }

    #[test]
    fn test_error_from_anyhow() {
        let anyhow_err = anyhow::anyhow!("custom error message");
        let err: Error = anyhow_err.into();

        match err {
            Error::Other(_) => {
                assert!(err.to_string().contains("custom error message"));
            }
            _ => panic!("Wrong error type"),
        }
    }
}
