//! # Expression Evaluation
//!
//! Tree-walking evaluator with column aggregation.

mod errors;
mod evaluator;

pub use errors::{EvalError, EvalErrorKind, EvalResult};
pub use evaluator::Evaluator;
