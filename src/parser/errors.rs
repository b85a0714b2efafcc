//! # Parse Errors

use thiserror::Error;

/// Result type for parsing
pub type ParseResult<T> = Result<T, ParseError>;

/// Parse errors. Offsets are byte positions in the query text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unexpected character {ch:?} at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("unclosed string starting at offset {0}")]
    UnclosedString(usize),

    #[error("control character in string at offset {0}")]
    ControlCharacter(usize),

    #[error("invalid number {text:?} at offset {offset}")]
    InvalidNumber { text: String, offset: usize },

    #[error("expected {expected} but found {found} at offset {offset}")]
    UnexpectedToken {
        expected: String,
        found: String,
        offset: usize,
    },

    #[error("unsupported: {what} at offset {offset}")]
    Unsupported { what: String, offset: usize },
}

impl ParseError {
    /// Byte offset of the offending input
    pub fn offset(&self) -> usize {
        match self {
            ParseError::UnexpectedChar { offset, .. }
            | ParseError::InvalidNumber { offset, .. }
            | ParseError::UnexpectedToken { offset, .. }
            | ParseError::Unsupported { offset, .. } => *offset,
            ParseError::UnclosedString(offset) | ParseError::ControlCharacter(offset) => *offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset() {
        assert_eq!(ParseError::UnclosedString(4).offset(), 4);
        let err = ParseError::UnexpectedToken {
            expected: "FROM".into(),
            found: "end of input".into(),
            offset: 9,
        };
        assert_eq!(err.offset(), 9);
        assert!(err.to_string().contains("offset 9"));
    }
}
