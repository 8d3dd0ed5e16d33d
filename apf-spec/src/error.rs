//! Error types for the APF wire format.

use thiserror::Error;

/// Errors raised while constructing wire-format values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpecError {
    /// Value outside the domain implied by an immediate's kind
    #[error("{name}: {value}, must be in range [{min}, {max}]")]
    ValueOutOfRange {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}

/// Result type for wire-format operations.
pub type SpecResult<T> = Result<T, SpecError>;

pub(crate) fn check_range(
    name: &'static str,
    value: i64,
    min: i64,
    max: i64,
) -> Result<(), SpecError> {
    if value >= min && value <= max {
        return Ok(());
    }
    Err(SpecError::ValueOutOfRange {
        name,
        value,
        min,
        max,
    })
}
