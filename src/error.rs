//! Error taxonomy for the k-space pipeline
//!
//! Every error is local to the call that produced it: the session keeps its
//! prior state and the caller decides how to surface the failure.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum KspaceError {
    /// Grid dimensions are zero or inconsistent with the supplied data
    #[error("unsupported shape: {0}")]
    UnsupportedShape(String),

    /// A parameter value outside its domain, or a parameter that is currently disabled
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// A coordinate outside the current grid
    #[error("coordinate ({row}, {col}) outside {rows}x{cols} grid")]
    OutOfBounds {
        row: i64,
        col: i64,
        rows: usize,
        cols: usize,
    },

    /// A stage could not produce a defined result (e.g. SNR of an all-zero signal)
    #[error("numerically degenerate input: {0}")]
    NumericalDegenerate(String),
}

impl KspaceError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        KspaceError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, KspaceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = KspaceError::invalid("low_pass", "must be within 0..=100, got 120");
        assert_eq!(
            err.to_string(),
            "invalid parameter `low_pass`: must be within 0..=100, got 120"
        );

        let err = KspaceError::OutOfBounds { row: -1, col: 3, rows: 4, cols: 4 };
        assert_eq!(err.to_string(), "coordinate (-1, 3) outside 4x4 grid");
    }
}
