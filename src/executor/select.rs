//! SELECT projection
//!
//! A projection that calls an aggregation function runs in one of two
//! modes. Over grouped input it emits one row per group. Over raw rows it
//! buffers the whole input and emits a single row computed from columns
//! spanning every buffered row.

use tokio::sync::mpsc::{self, Receiver, Sender};

use crate::ast::{Expr, FunctionCall};
use crate::env::Environment;
use crate::eval::Evaluator;
use crate::functions::is_aggregation_name;
use crate::value::Value;

use super::errors::{ExecutorError, ExecutorResult};
use super::stream::{
    bind_envelope, bind_rows, emit, fail, next_input, Envelope, FileRow, Next, ProjectedRow,
    StageContext,
};

const STAGE: &str = "select";

/// True if `expr` calls an aggregation function anywhere
pub fn contains_aggregation(expr: &Expr) -> bool {
    expr.any_call(&|call: &FunctionCall| is_aggregation_name(&call.name))
}

/// The SELECT stage
pub struct Projector {
    exprs: Vec<Expr>,
    is_aggregation: bool,
}

impl Projector {
    pub fn new(exprs: Vec<Expr>) -> Self {
        let is_aggregation = exprs.iter().any(contains_aggregation);
        Self {
            exprs,
            is_aggregation,
        }
    }

    pub fn is_aggregation(&self) -> bool {
        self.is_aggregation
    }

    pub fn spawn(self, ctx: StageContext, input: Receiver<Envelope>) -> Receiver<ProjectedRow> {
        let (tx, rx) = mpsc::channel(ctx.capacity);
        tokio::spawn(self.run(ctx, input, tx));
        rx
    }

    async fn run(
        self,
        ctx: StageContext,
        mut input: Receiver<Envelope>,
        output: Sender<ProjectedRow>,
    ) {
        let evaluator = Evaluator::new(&ctx.registry);
        let mut seen = 0usize;
        let mut buffered: Vec<FileRow> = Vec::new();
        loop {
            let envelope = match next_input(STAGE, &mut input, &output, &ctx.cancel).await {
                Next::Item(envelope) => envelope,
                Next::End => break,
                Next::Stop => return,
            };
            seen += 1;

            let envelope = match envelope {
                Envelope::Raw(row) if self.is_aggregation => {
                    buffered.push(row);
                    continue;
                }
                other => other,
            };
            let Some(mut env) = bind_envelope(&ctx.env, &envelope) else {
                continue;
            };
            match self.project(&evaluator, &mut env) {
                Ok(values) => {
                    if !emit(&output, Ok(values)).await {
                        return;
                    }
                }
                Err(err) => return fail(STAGE, &output, err).await,
            }
        }

        if buffered.is_empty() {
            return;
        }
        if buffered.len() != seen {
            let err = ExecutorError::invalid_select_source(seen, buffered.len());
            return fail(STAGE, &output, err).await;
        }

        let mut env = bind_rows(&ctx.env, &buffered);
        match self.project(&evaluator, &mut env) {
            Ok(values) => {
                let _ = emit(&output, Ok(values)).await;
            }
            Err(err) => fail(STAGE, &output, err).await,
        }
    }

    fn project(
        &self,
        evaluator: &Evaluator<'_>,
        env: &mut Environment,
    ) -> ExecutorResult<Vec<Value>> {
        let mut values = Vec::with_capacity(self.exprs.len());
        for expr in &self.exprs {
            values.push(evaluator.evaluate(expr, env)?);
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::stream::testing::{collect, feed, file};
    use crate::executor::stream::GroupedRow;
    use crate::executor::{CancelToken, ExecutorErrorCode};
    use crate::functions::FunctionRegistry;
    use crate::parser::parse_expr;
    use std::sync::Arc;

    fn ctx() -> StageContext {
        StageContext::new(
            Environment::new(),
            Arc::new(FunctionRegistry::standard()),
            CancelToken::new(),
        )
    }

    fn exprs(src: &[&str]) -> Vec<Expr> {
        src.iter().map(|s| parse_expr(s).unwrap()).collect()
    }

    fn group(size: i64, names: &[&str]) -> Envelope {
        Envelope::Grouped(GroupedRow {
            key: "size".into(),
            value: Value::Int(size),
            members: names.iter().map(|n| file(n, size)).collect(),
        })
    }

    #[test]
    fn test_detects_aggregation() {
        assert!(Projector::new(exprs(&["name", "sum(size) + 1"])).is_aggregation());
        assert!(Projector::new(exprs(&["COUNT(name)"])).is_aggregation());
        assert!(!Projector::new(exprs(&["name", "len(name)"])).is_aggregation());
    }

    #[tokio::test]
    async fn test_per_row_projection() {
        let input = feed(vec![Envelope::Raw(file("a", 1)), Envelope::Raw(file("b", 3))]);
        let out = collect(Projector::new(exprs(&["name", "size * 2"])).spawn(ctx(), input)).await;
        assert_eq!(
            out,
            vec![
                Ok(vec![Value::from("a"), Value::Int(2)]),
                Ok(vec![Value::from("b"), Value::Int(6)]),
            ]
        );
    }

    #[tokio::test]
    async fn test_whole_set_aggregation_emits_one_row() {
        let input = feed(vec![Envelope::Raw(file("a", 1)), Envelope::Raw(file("b", 3))]);
        let projector = Projector::new(exprs(&["sum(size)", "count(name)", "max(name)"]));
        let out = collect(projector.spawn(ctx(), input)).await;
        assert_eq!(out, vec![Ok(vec![Value::Int(4), Value::Int(2), Value::from("b")])]);
    }

    #[tokio::test]
    async fn test_aggregation_over_groups() {
        let input = feed(vec![group(1, &["a", "b"]), group(2, &["c"])]);
        let projector = Projector::new(exprs(&["size", "count(name)"]));
        let out = collect(projector.spawn(ctx(), input)).await;
        assert_eq!(
            out,
            vec![
                Ok(vec![Value::Int(1), Value::Int(2)]),
                Ok(vec![Value::Int(2), Value::Int(1)]),
            ]
        );
    }

    #[tokio::test]
    async fn test_mixed_input_is_invalid_source() {
        let input = feed(vec![group(1, &["a"]), Envelope::Raw(file("b", 3))]);
        let out = collect(Projector::new(exprs(&["count(name)"])).spawn(ctx(), input)).await;

        assert_eq!(out.len(), 2);
        assert_eq!(out[0], Ok(vec![Value::Int(1)]));
        assert_eq!(
            out[1].as_ref().unwrap_err().code(),
            ExecutorErrorCode::InvalidSelectSource
        );
    }

    #[tokio::test]
    async fn test_aggregation_over_nothing_emits_nothing() {
        let out = collect(Projector::new(exprs(&["count(name)"])).spawn(ctx(), feed(vec![]))).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_eval_failure_after_valid_rows() {
        let input = feed(vec![Envelope::Raw(file("a", 1)), Envelope::Raw(file("b", 0))]);
        let out = collect(Projector::new(exprs(&["10 / size"])).spawn(ctx(), input)).await;

        assert_eq!(out[0], Ok(vec![Value::Int(10)]));
        assert_eq!(out[1].as_ref().unwrap_err().code(), ExecutorErrorCode::EvalFailed);
        assert_eq!(out.len(), 2);
    }

    #[tokio::test]
    async fn test_pre_cancelled() {
        let ctx = ctx();
        ctx.cancel.cancel();
        let input = feed(vec![Envelope::Raw(file("a", 1))]);
        let out = collect(Projector::new(exprs(&["sum(size)"])).spawn(ctx, input)).await;

        assert_eq!(out.len(), 1);
        assert!(out[0].as_ref().unwrap_err().is_cancelled());
    }
}
