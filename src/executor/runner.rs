//! Query runner
//!
//! Wires `source -> where -> group by -> having -> order by -> limit ->
//! select [-> distinct]`, one task per stage. Clauses the statement does not
//! have are left out of the chain, except GROUP BY which always runs to
//! wrap rows into envelopes.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc::Receiver;

use crate::ast::Statement;
use crate::env::Environment;
use crate::functions::FunctionRegistry;
use crate::observability::{log_event_with_fields, Event};

use super::cancel::CancelToken;
use super::distinct::Deduplicator;
use super::errors::{ExecutorError, ExecutorResult};
use super::filters::WhereFilter;
use super::grouper::Grouper;
use super::having::HavingFilter;
use super::limit::Limiter;
use super::preprocess::preprocess;
use super::select::{contains_aggregation, Projector};
use super::sorter::ResultSorter;
use super::source::{FsSource, RowSource};
use super::stream::{ProjectedRow, StageContext, DEFAULT_CHANNEL_CAPACITY};

/// Runs one parsed statement
pub struct QueryRunner {
    statement: Statement,
    group_key: Option<String>,
    headers: Vec<String>,
    /// WHERE sees scalar functions only
    scalar: Arc<FunctionRegistry>,
    standard: Arc<FunctionRegistry>,
    capacity: usize,
}

impl QueryRunner {
    /// Prepares `statement` for running. Fails on an aliased `all` or a
    /// GROUP BY term that is not a plain name.
    pub fn new(statement: Statement) -> ExecutorResult<Self> {
        let statement = preprocess(statement)?;
        let group_key = match &statement.group_by {
            None => None,
            Some(expr) => match expr.as_ident() {
                Some(name) => Some(name.to_string()),
                None => {
                    return Err(ExecutorError::invalid_ident(format!(
                        "group by wants a column name but got {}",
                        expr
                    )))
                }
            },
        };
        let headers = statement.headers();

        Ok(Self {
            statement,
            group_key,
            headers,
            scalar: Arc::new(FunctionRegistry::scalar()),
            standard: Arc::new(FunctionRegistry::standard()),
            capacity: DEFAULT_CHANNEL_CAPACITY,
        })
    }

    /// Sets the queue length between stages
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Output column names: the alias if given, else the expression text
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// The statement after preprocessing
    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    /// True if the projection calls an aggregation function
    pub fn is_aggregation(&self) -> bool {
        self.statement
            .select
            .iter()
            .any(|term| contains_aggregation(&term.expr))
    }

    /// Bindings shared by every stage: each select alias bound to its
    /// unevaluated expression
    pub fn base_env(&self) -> Environment {
        let mut env = Environment::new();
        for term in &self.statement.select {
            if let Some(alias) = &term.alias {
                env.set_lazy(alias, term.expr.clone());
            }
        }
        env
    }

    /// Runs over the filesystem below `roots`
    pub fn run<I, P>(&self, roots: I, cancel: CancelToken) -> Receiver<ProjectedRow>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.run_with_source(&FsSource::new(roots), cancel)
    }

    /// Runs over rows from `source`. Must be called inside a tokio runtime.
    pub fn run_with_source(
        &self,
        source: &dyn RowSource,
        cancel: CancelToken,
    ) -> Receiver<ProjectedRow> {
        let aggregation = self.is_aggregation().to_string();
        let headers = self.headers.join(",");
        log_event_with_fields(
            Event::QueryStart,
            &[("headers", headers.as_str()), ("aggregation", aggregation.as_str())],
        );

        let ctx = StageContext::new(self.base_env(), Arc::clone(&self.standard), cancel.clone())
            .with_capacity(self.capacity);
        let stmt = &self.statement;

        let mut rows = source.spawn(cancel, self.capacity);
        if let Some(condition) = &stmt.where_clause {
            let where_ctx = ctx.clone().with_registry(Arc::clone(&self.scalar));
            rows = WhereFilter::new(condition.clone()).spawn(where_ctx, rows);
        }

        let grouper = match &self.group_key {
            Some(key) => Grouper::new(key.clone()),
            None => Grouper::pass_through(),
        };
        let mut items = grouper.spawn(ctx.clone(), rows);
        if let Some(condition) = &stmt.having {
            items = HavingFilter::new(condition.clone()).spawn(ctx.clone(), items);
        }
        if let Some(order) = &stmt.order_by {
            items = ResultSorter::new(order.clone()).spawn(ctx.clone(), items);
        }
        if let Some(limit) = &stmt.limit {
            items = Limiter::new(limit.limit, limit.offset).spawn(ctx.clone(), items);
        }

        let exprs = stmt.select.iter().map(|term| term.expr.clone()).collect();
        let mut projected = Projector::new(exprs).spawn(ctx.clone(), items);
        if stmt.distinct {
            projected = Deduplicator::new().spawn(ctx, projected);
        }
        projected
    }
}
