//! Validation errors raised while building domain values.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: &'static str,
        min: u8,
        max: u8,
        actual: u8,
    },
}

impl ValidationError {
    pub fn out_of_range(field: &'static str, min: u8, max: u8, actual: u8) -> Self {
        ValidationError::OutOfRange {
            field,
            min,
            max,
            actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_message_names_the_field() {
        let err = ValidationError::out_of_range("cost", 1, 5, 9);
        assert_eq!(err.to_string(), "'cost' must be between 1 and 5, got 9");
    }
}
