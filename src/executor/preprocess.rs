//! Statement rewriting done once before a run

use crate::ast::{Expr, SelectTerm, Statement};

use super::errors::{ExecutorError, ExecutorResult};
use super::stream::COLUMNS;

/// Select term that stands for every metadata column
pub const SELECT_ALL: &str = "all";

/// Replaces each bare `all` select term with the metadata columns.
///
/// `all` cannot carry an alias.
pub fn expand_select_all(terms: Vec<SelectTerm>) -> ExecutorResult<Vec<SelectTerm>> {
    let mut expanded = Vec::with_capacity(terms.len());
    for term in terms {
        if term.expr.as_ident() != Some(SELECT_ALL) {
            expanded.push(term);
            continue;
        }
        if let Some(alias) = &term.alias {
            return Err(ExecutorError::invalid_select_all(alias));
        }
        expanded.extend(COLUMNS.iter().map(|c| SelectTerm::new(Expr::ident(*c))));
    }
    Ok(expanded)
}

/// Applies every rewrite to `statement`
pub fn preprocess(mut statement: Statement) -> ExecutorResult<Statement> {
    statement.select = expand_select_all(statement.select)?;
    Ok(statement)
}
