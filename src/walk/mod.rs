//! # Filesystem Walk
//!
//! The row source's traversal primitive.

mod walker;

pub use walker::{Entry, Visit, WalkError, WalkResult, Walker};
