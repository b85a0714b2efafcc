//! Executor error types
//!
//! Error codes:
//! - DIRQL_CANCELLED
//! - DIRQL_NOT_BOOL_EXPR
//! - DIRQL_INVALID_IDENT
//! - DIRQL_INVALID_IDENT_REF
//! - DIRQL_INVALID_HAVING
//! - DIRQL_INVALID_LIMIT
//! - DIRQL_INVALID_SELECT_SOURCE
//! - DIRQL_INVALID_SELECT_ALL
//! - DIRQL_MIXED_SORT_KEYS
//! - DIRQL_EVAL_FAILED
//! - DIRQL_SOURCE_FAILED

use std::fmt;

use crate::eval::{EvalError, EvalErrorKind};

/// Executor-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorErrorCode {
    /// The run was cancelled through its token
    Cancelled,
    /// A filter condition produced a non-Bool value
    NotBoolExpr,
    /// A row has no column with the grouping key's name
    InvalidIdent,
    /// The grouping key is bound to something other than a column name
    InvalidIdentRef,
    /// HAVING received ungrouped rows
    InvalidHaving,
    /// LIMIT below 1 or OFFSET below 0
    InvalidLimit,
    /// Aggregating projection saw grouped and ungrouped items together
    InvalidSelectSource,
    /// `all` was given an alias
    InvalidSelectAll,
    /// ORDER BY keys of different types
    MixedSortKeys,
    /// Expression evaluation failed
    EvalFailed,
    /// The row source failed
    SourceFailed,
}

impl ExecutorErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorErrorCode::Cancelled => "DIRQL_CANCELLED",
            ExecutorErrorCode::NotBoolExpr => "DIRQL_NOT_BOOL_EXPR",
            ExecutorErrorCode::InvalidIdent => "DIRQL_INVALID_IDENT",
            ExecutorErrorCode::InvalidIdentRef => "DIRQL_INVALID_IDENT_REF",
            ExecutorErrorCode::InvalidHaving => "DIRQL_INVALID_HAVING",
            ExecutorErrorCode::InvalidLimit => "DIRQL_INVALID_LIMIT",
            ExecutorErrorCode::InvalidSelectSource => "DIRQL_INVALID_SELECT_SOURCE",
            ExecutorErrorCode::InvalidSelectAll => "DIRQL_INVALID_SELECT_ALL",
            ExecutorErrorCode::MixedSortKeys => "DIRQL_MIXED_SORT_KEYS",
            ExecutorErrorCode::EvalFailed => "DIRQL_EVAL_FAILED",
            ExecutorErrorCode::SourceFailed => "DIRQL_SOURCE_FAILED",
        }
    }
}

impl fmt::Display for ExecutorErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Executor error type with full context
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorError {
    code: ExecutorErrorCode,
    message: String,
    /// Set when the failure came from the evaluator
    eval_kind: Option<EvalErrorKind>,
}

impl ExecutorError {
    fn new(code: ExecutorErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            eval_kind: None,
        }
    }

    pub fn cancelled(stage: &str) -> Self {
        Self::new(ExecutorErrorCode::Cancelled, format!("{} cancelled", stage))
    }

    pub fn not_bool_expr(reason: impl Into<String>) -> Self {
        Self::new(ExecutorErrorCode::NotBoolExpr, reason)
    }

    pub fn invalid_ident(reason: impl Into<String>) -> Self {
        Self::new(ExecutorErrorCode::InvalidIdent, reason)
    }

    pub fn invalid_ident_ref(reason: impl Into<String>) -> Self {
        Self::new(ExecutorErrorCode::InvalidIdentRef, reason)
    }

    pub fn invalid_having(reason: impl Into<String>) -> Self {
        Self::new(ExecutorErrorCode::InvalidHaving, reason)
    }

    pub fn invalid_limit(limit: i64, offset: i64) -> Self {
        Self::new(
            ExecutorErrorCode::InvalidLimit,
            format!(
                "limit {} offset {}: limit must be at least 1 and offset at least 0",
                limit, offset
            ),
        )
    }

    pub fn invalid_select_source(rows: usize, raw: usize) -> Self {
        Self::new(
            ExecutorErrorCode::InvalidSelectSource,
            format!("select got {} rows but {} raw on aggregation", rows, raw),
        )
    }

    pub fn invalid_select_all(alias: &str) -> Self {
        Self::new(
            ExecutorErrorCode::InvalidSelectAll,
            format!("all cannot be aliased (as {})", alias),
        )
    }

    pub fn mixed_sort_keys(reason: impl Into<String>) -> Self {
        Self::new(ExecutorErrorCode::MixedSortKeys, reason)
    }

    pub fn source_failed(reason: impl Into<String>) -> Self {
        Self::new(ExecutorErrorCode::SourceFailed, reason)
    }

    /// Prefixes the message with where the failure happened
    pub fn in_stage(mut self, stage: &str) -> Self {
        self.message = format!("{}: {}", stage, self.message);
        self
    }

    pub fn code(&self) -> ExecutorErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Evaluator error kind, for `DIRQL_EVAL_FAILED`
    pub fn eval_kind(&self) -> Option<EvalErrorKind> {
        self.eval_kind
    }

    pub fn is_cancelled(&self) -> bool {
        self.code == ExecutorErrorCode::Cancelled
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl std::error::Error for ExecutorError {}

impl From<EvalError> for ExecutorError {
    fn from(err: EvalError) -> Self {
        Self {
            code: ExecutorErrorCode::EvalFailed,
            message: err.to_string(),
            eval_kind: Some(err.kind()),
        }
    }
}

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;
