//! Error type shared by every component of the basis-function core.

use thiserror::Error;

/// Precondition failures raised by the algebra and the basis builders.
///
/// Numeric degeneracies (division by a zero denominator, evaluation at a pole) are not
/// errors: they propagate as IEEE infinities or NaN in the returned values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BasisError {
    #[error("Order (m) must be at least 1, got {0}.")]
    InvalidOrder(usize),

    #[error("Invalid support [{lower}, {upper}]: bounds must be ordered and not NaN.")]
    InvalidSupport { lower: f64, upper: f64 },

    #[error("{operation} is not supported: {hint}.")]
    UnsupportedOperation {
        operation: &'static str,
        hint: &'static str,
    },

    #[error("Length mismatch: expected {expected} {what}, got {actual}.")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Scale factor must be finite and non-zero, got {0}.")]
    InvalidScale(f64),

    #[error("Knot index {index} is out of bounds for a knot vector of length {len}.")]
    KnotIndexOutOfBounds { index: usize, len: usize },

    #[error("Knot vector is not non-decreasing at index {index}: {left} > {right}.")]
    UnsortedKnots { index: usize, left: f64, right: f64 },

    #[error("Knot {value} lies outside the domain [{lower}, {upper}].")]
    KnotOutsideDomain { value: f64, lower: f64, upper: f64 },

    #[error("Invalid knot vector: {0}")]
    InvalidKnotVector(String),

    #[error("Invalid domain [{lower}, {upper}]: lower bound must be below upper bound.")]
    InvalidDomain { lower: f64, upper: f64 },
}

pub type Result<T> = std::result::Result<T, BasisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_values() {
        assert_eq!(
            BasisError::InvalidOrder(0).to_string(),
            "Order (m) must be at least 1, got 0."
        );
        let unsorted = BasisError::UnsortedKnots { index: 2, left: 3.0, right: 1.0 };
        assert_eq!(
            unsorted.to_string(),
            "Knot vector is not non-decreasing at index 2: 3 > 1."
        );
    }
}
