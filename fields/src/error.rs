//! Field decoding errors.

use thiserror::Error;

/// Result type for field decoding.
pub type FieldResult<T> = Result<T, FieldError>;

/// Errors that can occur when decoding raw field data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldError {
    /// Raw field index outside the static layout.
    #[error("field index {raw} outside layout of {count} fields")]
    IndexOutOfRange { raw: u8, count: usize },

    /// Raw provenance value that names no source.
    #[error("invalid provenance value {raw}")]
    InvalidSource { raw: u8 },

    /// Field name that does not parse.
    #[error("unknown field name")]
    UnknownField,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_values() {
        let msg = FieldError::IndexOutOfRange { raw: 99, count: 74 }.to_string();
        assert!(msg.contains("99"));
        assert!(msg.contains("74"));
        assert!(FieldError::InvalidSource { raw: 9 }.to_string().contains('9'));
    }

    #[test]
    fn error_is_std_error() {
        fn assert_error<E: std::error::Error>() {}
        assert_error::<FieldError>();
    }
}
