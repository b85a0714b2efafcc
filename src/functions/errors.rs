//! # Function Errors

use thiserror::Error;

use crate::ops::OpError;

/// Result type for function calls
pub type FunctionResult<T> = Result<T, FunctionError>;

/// Function errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FunctionError {
    #[error("Function not found: {0}")]
    NotFound(String),

    #[error("Function already exists: {0}")]
    AlreadyExists(String),

    #[error("{name}: want {expected} arguments but got {got}")]
    ArgumentCount {
        name: &'static str,
        expected: &'static str,
        got: usize,
    },

    #[error("{name}: invalid argument: {detail}")]
    InvalidArgument { name: &'static str, detail: String },

    #[error(transparent)]
    Op(#[from] OpError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FunctionError {
    pub(crate) fn invalid(name: &'static str, detail: impl Into<String>) -> Self {
        FunctionError::InvalidArgument {
            name,
            detail: detail.into(),
        }
    }
}
