//! Error types for network construction and stepping.

use thiserror::Error;

/// Errors raised by the CTRNN core
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CtrnnError {
    /// `initialise` was called before a configuration was set
    #[error("no configuration set for CTRNN")]
    ConfigurationMissing,

    /// Input vector shorter than the number of input nodes
    #[error("too few inputs for CTRNN configuration: expected {expected}, got {actual}")]
    TooFewInputs { expected: usize, actual: usize },

    /// A required input is NaN/infinite, or addresses a slot that does not exist
    #[error("invalid input at index {index}: {value}")]
    InvalidInput { index: usize, value: f64 },

    /// A mapped or supplied parameter cannot drive the dynamics
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A node's weight vector does not match its input count
    #[error("{node}: expected {expected} weights, found {actual}")]
    WeightCountMismatch {
        node: String,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, CtrnnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CtrnnError::TooFewInputs {
            expected: 3,
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "too few inputs for CTRNN configuration: expected 3, got 1"
        );

        let err = CtrnnError::WeightCountMismatch {
            node: "hidden node 2".to_string(),
            expected: 5,
            actual: 4,
        };
        assert_eq!(err.to_string(), "hidden node 2: expected 5 weights, found 4");
    }
}
