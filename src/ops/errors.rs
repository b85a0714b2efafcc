//! # Operator Errors

use thiserror::Error;

use crate::value::ValueType;

/// Result type for scalar operators
pub type OpResult<T> = Result<T, OpError>;

/// Scalar operator errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OpError {
    #[error("invalid argument for {op}: {detail}")]
    InvalidArgument { op: &'static str, detail: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("cannot cast {from} to {to}")]
    CannotCast { from: ValueType, to: String },

    #[error("unknown cast target: {0}")]
    UnknownCastTarget(String),

    #[error("invalid binary string: {0:?}")]
    InvalidBinaryString(String),

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
}

impl OpError {
    pub(crate) fn invalid(op: &'static str, detail: impl Into<String>) -> Self {
        OpError::InvalidArgument {
            op,
            detail: detail.into(),
        }
    }
}
