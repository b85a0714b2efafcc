//! dirql - SQL-like queries over filesystem metadata
//!
//! ```text
//! select name, size where size > 1024 and ext(name) = "rs" order by size desc limit 10
//! ```
//!
//! Query text is parsed into a [`ast::Statement`] and run by an
//! [`executor::QueryRunner`] as a pipeline of concurrent stages fed by a
//! filesystem walk.

pub mod ast;
pub mod cli;
pub mod env;
pub mod eval;
pub mod executor;
pub mod functions;
pub mod observability;
pub mod ops;
pub mod parser;
pub mod value;
pub mod walk;
