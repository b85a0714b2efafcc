//! # Functions
//!
//! Built-in scalar and aggregation functions and the registry the
//! evaluator resolves calls against.

pub mod aggregate;
pub mod errors;
pub mod function;
pub mod registry;
pub mod scalar;

pub use aggregate::AGGREGATION_NAMES;
pub use errors::{FunctionError, FunctionResult};
pub use function::{Function, FunctionKind};
pub use registry::{is_aggregation_name, FunctionRegistry};
