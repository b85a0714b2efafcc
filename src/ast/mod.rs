//! Query syntax tree
//!
//! Built by the parser, consumed by the evaluator and the pipeline.

mod expr;
mod statement;

pub use expr::{
    ArithmeticOp, BitExpr, BitOp, ComparisonOp, Expr, FunctionCall, Lit, Predicate, PrefixOp,
    SimpleExpr,
};
pub use statement::{LimitClause, OrderBy, SelectTerm, SortDirection, Statement};
