//! # Evaluation Errors

use std::fmt;

use thiserror::Error;

use crate::functions::FunctionError;
use crate::ops::OpError;

/// Result type for evaluation
pub type EvalResult<T> = Result<T, EvalError>;

/// Coarse classification of an evaluation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalErrorKind {
    TypeMismatch,
    UnknownExpr,
    NestedAggregation,
    AggregationArgCount,
    MixedAggregationTargets,
    Function,
    Operator,
}

impl EvalErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvalErrorKind::TypeMismatch => "type_mismatch",
            EvalErrorKind::UnknownExpr => "unknown_expr",
            EvalErrorKind::NestedAggregation => "nested_aggregation",
            EvalErrorKind::AggregationArgCount => "aggregation_arg_count",
            EvalErrorKind::MixedAggregationTargets => "mixed_aggregation_targets",
            EvalErrorKind::Function => "function",
            EvalErrorKind::Operator => "operator",
        }
    }
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Evaluation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("unknown expr: {0}")]
    UnknownExpr(String),

    #[error("aggregation cannot be nested: {0}")]
    NestedAggregation(String),

    #[error("aggregation {name} wants exactly 1 argument but got {got}")]
    AggregationArgCount { name: String, got: usize },

    #[error("aggregation cannot depend on multiple columns: {first} and {second}")]
    MixedAggregationTargets { first: String, second: String },

    #[error("function {name}: {source}")]
    Function {
        name: String,
        #[source]
        source: FunctionError,
    },

    #[error(transparent)]
    Op(OpError),
}

impl EvalError {
    pub fn kind(&self) -> EvalErrorKind {
        match self {
            EvalError::TypeMismatch(_) => EvalErrorKind::TypeMismatch,
            EvalError::UnknownExpr(_) => EvalErrorKind::UnknownExpr,
            EvalError::NestedAggregation(_) => EvalErrorKind::NestedAggregation,
            EvalError::AggregationArgCount { .. } => EvalErrorKind::AggregationArgCount,
            EvalError::MixedAggregationTargets { .. } => EvalErrorKind::MixedAggregationTargets,
            EvalError::Function { .. } => EvalErrorKind::Function,
            EvalError::Op(_) => EvalErrorKind::Operator,
        }
    }
}

impl From<OpError> for EvalError {
    fn from(err: OpError) -> Self {
        match err {
            OpError::InvalidArgument { .. } => EvalError::TypeMismatch(err.to_string()),
            other => EvalError::Op(other),
        }
    }
}
