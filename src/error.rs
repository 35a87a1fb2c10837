//! Error types for loan evaluation

use serde::Serialize;
use thiserror::Error;

/// Result alias used across the engine
pub type LoanResult<T> = Result<T, LoanError>;

/// Failures an evaluation can surface to its caller
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum LoanError {
    /// Rejected before any numeric work is done
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// Newton-Raphson hit a zero derivative or ran out of iterations
    #[error("Rate solver did not converge after {iterations} iterations (last step: {last_step:.3e})")]
    NonConvergence { iterations: u32, last_step: f64 },

    /// An intermediate value left the finite range
    #[error("Numeric overflow in {operation}")]
    NumericOverflow { operation: String },
}

impl LoanError {
    pub fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        LoanError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn overflow(operation: &str) -> Self {
        LoanError::NumericOverflow {
            operation: operation.to_string(),
        }
    }

    /// True for errors caused by the caller's inputs rather than the numerics
    pub fn is_input_error(&self) -> bool {
        matches!(self, LoanError::InvalidInput { .. })
    }
}

/// Reject NaN and infinities produced by `operation`
pub(crate) fn ensure_finite(value: f64, operation: &str) -> LoanResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(LoanError::overflow(operation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = LoanError::invalid_input("installment", "must be positive");
        assert_eq!(err.to_string(), "Invalid input: installment: must be positive");
        assert!(err.is_input_error());

        let err = LoanError::NonConvergence { iterations: 100, last_step: 0.5 };
        assert!(err.to_string().contains("100 iterations"));
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_ensure_finite() {
        assert_eq!(ensure_finite(1.5, "pv"), Ok(1.5));
        assert_eq!(ensure_finite(f64::NAN, "pv"), Err(LoanError::overflow("pv")));
        assert!(ensure_finite(f64::INFINITY, "pv").is_err());
    }
}
