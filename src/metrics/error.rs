//! Significance test errors.

use thiserror::Error;

/// Result type for significance tests.
pub type TTestResult<T> = Result<T, TTestError>;

/// Reasons a two-sample test cannot be computed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TTestError {
    #[error("too few samples: {left} and {right}, need at least 2 on each side")]
    TooFewSamples { left: usize, right: usize },

    #[error("both samples have zero variance")]
    ZeroVariance,
}
