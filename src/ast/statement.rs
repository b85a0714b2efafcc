//! Statement sections
//!
//! A parsed `SELECT` statement. GROUP BY and ORDER BY carry a single term.

use serde::Serialize;

use super::expr::Expr;

/// One projection term: an expression with an optional alias
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectTerm {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectTerm {
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    pub fn aliased(expr: Expr, alias: impl Into<String>) -> Self {
        Self {
            expr,
            alias: Some(alias.into()),
        }
    }

    /// Column header: the alias if given, else the rendered expression
    pub fn header(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => self.expr.to_string(),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// ORDER BY term
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderBy {
    pub expr: Expr,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            direction: SortDirection::Desc,
        }
    }

    pub fn is_descending(&self) -> bool {
        self.direction == SortDirection::Desc
    }
}

/// LIMIT clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LimitClause {
    pub limit: i64,
    pub offset: Option<i64>,
}

/// A parsed query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub select: Vec<SelectTerm>,
    pub distinct: bool,
    pub where_clause: Option<Expr>,
    pub group_by: Option<Expr>,
    pub having: Option<Expr>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<LimitClause>,
}

impl Statement {
    /// Creates a statement projecting `select`
    pub fn new(select: Vec<SelectTerm>) -> Self {
        Self {
            select,
            distinct: false,
            where_clause: None,
            group_by: None,
            having: None,
            order_by: None,
            limit: None,
        }
    }

    pub fn with_distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn with_where(mut self, expr: Expr) -> Self {
        self.where_clause = Some(expr);
        self
    }

    pub fn with_group_by(mut self, expr: Expr) -> Self {
        self.group_by = Some(expr);
        self
    }

    pub fn with_having(mut self, expr: Expr) -> Self {
        self.having = Some(expr);
        self
    }

    pub fn with_order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }

    pub fn with_limit(mut self, limit: i64, offset: Option<i64>) -> Self {
        self.limit = Some(LimitClause { limit, offset });
        self
    }

    /// Headers in projection order
    pub fn headers(&self) -> Vec<String> {
        self.select.iter().map(SelectTerm::header).collect()
    }
}
