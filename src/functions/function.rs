//! # Function Definition

use std::fmt;

use crate::value::Value;

use super::errors::{FunctionError, FunctionResult};

/// Whether a function maps scalars or folds a whole column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// Fixed arity over already evaluated arguments
    Scalar,
    /// Consumes one value per member of a column
    Aggregation,
}

impl FunctionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionKind::Scalar => "scalar",
            FunctionKind::Aggregation => "aggregation",
        }
    }
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A callable built-in
pub trait Function: Send + Sync {
    /// Lowercase registry name
    fn name(&self) -> &'static str;

    fn kind(&self) -> FunctionKind {
        FunctionKind::Scalar
    }

    fn call(&self, args: &[Value]) -> FunctionResult<Value>;
}

pub(crate) fn expect_args(
    name: &'static str,
    expected: &'static str,
    args: &[Value],
    n: usize,
) -> FunctionResult<()> {
    if args.len() != n {
        return Err(FunctionError::ArgumentCount {
            name,
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

pub(crate) fn expect_string<'a>(name: &'static str, v: &'a Value) -> FunctionResult<&'a str> {
    match v {
        Value::String(s) => Ok(s),
        other => Err(FunctionError::invalid(
            name,
            format!("want string but got {}", other.value_type()),
        )),
    }
}
