//! # Query Parser
//!
//! Turns query text into an `ast::Statement`.

mod errors;
mod lexer;
#[allow(clippy::module_inception)]
mod parser;

pub use errors::{ParseError, ParseResult};
pub use lexer::{Keyword, Lexer, Token, TokenKind};
pub use parser::{parse, parse_expr};
