//! WHERE filtering
//!
//! Keeps a row only when the condition evaluates to `Bool(true)`. Any other
//! value is a terminal `DIRQL_NOT_BOOL_EXPR`, not a skipped row.

use tokio::sync::mpsc::{self, Receiver, Sender};

use crate::ast::Expr;
use crate::env::Environment;
use crate::eval::Evaluator;
use crate::value::Value;

use super::errors::{ExecutorError, ExecutorResult};
use super::stream::{bind_row, emit, fail, next_input, Next, RowItem, StageContext};

const STAGE: &str = "where";

/// Evaluates `condition` and requires a Bool
pub(crate) fn check_condition(
    evaluator: &Evaluator<'_>,
    condition: &Expr,
    env: &mut Environment,
) -> ExecutorResult<bool> {
    match evaluator.evaluate(condition, env)? {
        Value::Bool(b) => Ok(b),
        other => Err(ExecutorError::not_bool_expr(format!(
            "{} evaluated to {} {}",
            condition,
            other.value_type(),
            other
        ))),
    }
}

/// The WHERE stage
pub struct WhereFilter {
    condition: Expr,
}

impl WhereFilter {
    pub fn new(condition: Expr) -> Self {
        Self { condition }
    }

    pub fn spawn(self, ctx: StageContext, input: Receiver<RowItem>) -> Receiver<RowItem> {
        let (tx, rx) = mpsc::channel(ctx.capacity);
        tokio::spawn(self.run(ctx, input, tx));
        rx
    }

    async fn run(
        self,
        ctx: StageContext,
        mut input: Receiver<RowItem>,
        output: Sender<RowItem>,
    ) {
        let evaluator = Evaluator::new(&ctx.registry);
        loop {
            let row = match next_input(STAGE, &mut input, &output, &ctx.cancel).await {
                Next::Item(row) => row,
                Next::End | Next::Stop => return,
            };

            let mut env = bind_row(&ctx.env, &row);
            match check_condition(&evaluator, &self.condition, &mut env) {
                Ok(true) => {
                    if !emit(&output, Ok(row)).await {
                        return;
                    }
                }
                Ok(false) => {}
                Err(err) => {
                    fail(STAGE, &output, err).await;
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ComparisonOp;
    use crate::eval::EvalErrorKind;
    use crate::executor::stream::testing::{collect, feed, file};
    use crate::executor::{CancelToken, ExecutorErrorCode};
    use crate::functions::FunctionRegistry;
    use crate::parser::parse_expr;
    use std::sync::Arc;

    fn ctx() -> StageContext {
        StageContext::new(
            Environment::new(),
            Arc::new(FunctionRegistry::scalar()),
            CancelToken::new(),
        )
    }

    fn size_above(n: i64) -> Expr {
        Expr::compare(ComparisonOp::GreaterThan, Expr::ident("size"), Expr::int(n))
    }

    #[tokio::test]
    async fn test_keeps_matching_rows_in_order() {
        let input = feed(vec![Ok(file("a", 1)), Ok(file("b", 3)), Ok(file("c", 5))]);
        let out = collect(WhereFilter::new(size_above(2)).spawn(ctx(), input)).await;
        assert_eq!(out, vec![Ok(file("b", 3)), Ok(file("c", 5))]);
    }

    #[tokio::test]
    async fn test_non_bool_condition_is_terminal() {
        let input = feed(vec![Ok(file("a", 1)), Ok(file("b", 3))]);
        let out = collect(WhereFilter::new(Expr::ident("size")).spawn(ctx(), input)).await;

        assert_eq!(out.len(), 1);
        let err = out[0].clone().unwrap_err();
        assert_eq!(err.code(), ExecutorErrorCode::NotBoolExpr);
        assert!(err.message().starts_with("where: size evaluated to int"));
    }

    #[tokio::test]
    async fn test_eval_failure_keeps_kind() {
        let input = feed(vec![Ok(file("a", 1))]);
        let cond = parse_expr("owner = 'root'").unwrap();
        let out = collect(WhereFilter::new(cond).spawn(ctx(), input)).await;

        let err = out[0].clone().unwrap_err();
        assert_eq!(err.code(), ExecutorErrorCode::EvalFailed);
        assert_eq!(err.eval_kind(), Some(EvalErrorKind::UnknownExpr));
    }

    #[tokio::test]
    async fn test_forwards_upstream_error_and_stops() {
        let upstream = ExecutorError::source_failed("disk gone");
        let input = feed(vec![Ok(file("a", 3)), Err(upstream.clone()), Ok(file("b", 3))]);
        let out = collect(WhereFilter::new(size_above(0)).spawn(ctx(), input)).await;
        assert_eq!(out, vec![Ok(file("a", 3)), Err(upstream)]);
    }

    #[tokio::test]
    async fn test_pre_cancelled() {
        let ctx = ctx();
        ctx.cancel.cancel();
        let input = feed(vec![Ok(file("a", 3))]);
        let out = collect(WhereFilter::new(size_above(0)).spawn(ctx, input)).await;

        assert_eq!(out.len(), 1);
        assert!(out[0].as_ref().unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_alias_binding_is_visible() {
        let mut env = Environment::new();
        env.set_lazy("big", size_above(2));
        let ctx = StageContext::new(env, Arc::new(FunctionRegistry::scalar()), CancelToken::new());

        let input = feed(vec![Ok(file("a", 1)), Ok(file("b", 3))]);
        let out = collect(WhereFilter::new(Expr::ident("big")).spawn(ctx, input)).await;
        assert_eq!(out, vec![Ok(file("b", 3))]);
    }
}
