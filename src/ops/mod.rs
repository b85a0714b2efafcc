//! # Scalar Operators
//!
//! Type-dispatched primitives used by the evaluator and the function
//! catalog. None of them touch the environment.

pub mod arithmetic;
pub mod bit;
pub mod cast;
pub mod compare;
mod errors;

pub use cast::{cast, CastTarget};
pub use errors::{OpError, OpResult};
