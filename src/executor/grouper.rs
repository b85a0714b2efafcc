//! GROUP BY
//!
//! Materializes the whole input and partitions it by one column. Without a
//! key every row passes through as `Envelope::Raw`.

use std::collections::HashMap;

use tokio::sync::mpsc::{self, Receiver, Sender};

use crate::env::{Binding, Environment};

use super::errors::{ExecutorError, ExecutorResult};
use super::stream::{
    emit, fail, next_input, Envelope, GroupedRow, Next, RowItem, StageContext, ValueKey,
};

const STAGE: &str = "group by";

/// Resolves a grouping key to a column name.
///
/// An unbound key is used as is. A key bound to a bare identifier (an
/// alias such as `select size as s ... group by s`) resolves to that
/// identifier. Any other binding is `DIRQL_INVALID_IDENT_REF`.
pub fn resolve_key(env: &Environment, key: &str) -> ExecutorResult<String> {
    match env.get(key) {
        None => Ok(key.to_string()),
        Some(Binding::Lazy(expr)) => match expr.as_ident() {
            Some(name) => Ok(name.to_string()),
            None => Err(ExecutorError::invalid_ident_ref(format!(
                "{} refers to {}, not a column",
                key, expr
            ))),
        },
        Some(other) => Err(ExecutorError::invalid_ident_ref(format!(
            "{} is bound to a {}",
            key,
            other.kind()
        ))),
    }
}

/// The GROUP BY stage
pub struct Grouper {
    key: Option<String>,
}

impl Grouper {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
        }
    }

    /// Wraps every row as `Envelope::Raw`
    pub fn pass_through() -> Self {
        Self { key: None }
    }

    pub fn spawn(self, ctx: StageContext, input: Receiver<RowItem>) -> Receiver<Envelope> {
        let (tx, rx) = mpsc::channel(ctx.capacity);
        tokio::spawn(self.run(ctx, input, tx));
        rx
    }

    async fn run(
        self,
        ctx: StageContext,
        mut input: Receiver<RowItem>,
        output: Sender<Envelope>,
    ) {
        let key = match &self.key {
            None => return pass_through(ctx, input, output).await,
            Some(key) => key,
        };
        if ctx.cancel.is_cancelled() {
            let _ = output.send(Envelope::Error(ExecutorError::cancelled(STAGE))).await;
            return;
        }
        let column = match resolve_key(&ctx.env, key) {
            Ok(column) => column,
            Err(err) => return fail(STAGE, &output, err).await,
        };

        let mut index: HashMap<ValueKey, usize> = HashMap::new();
        let mut groups: Vec<GroupedRow> = Vec::new();
        loop {
            let row = match next_input(STAGE, &mut input, &output, &ctx.cancel).await {
                Next::Item(row) => row,
                Next::End => break,
                Next::Stop => return,
            };

            let value = match row.get(&column) {
                Some(value) => value,
                None => {
                    let err = ExecutorError::invalid_ident(format!("no column {}", column));
                    return fail(STAGE, &output, err).await;
                }
            };
            let slot = *index.entry(ValueKey::from(&value)).or_insert_with(|| {
                groups.push(GroupedRow {
                    key: column.clone(),
                    value,
                    members: Vec::new(),
                });
                groups.len() - 1
            });
            groups[slot].members.push(row);
        }

        for group in groups {
            if ctx.cancel.is_cancelled() {
                let _ = output.send(Envelope::Error(ExecutorError::cancelled(STAGE))).await;
                return;
            }
            if !emit(&output, Envelope::Grouped(group)).await {
                return;
            }
        }
    }
}

async fn pass_through(ctx: StageContext, mut input: Receiver<RowItem>, output: Sender<Envelope>) {
    loop {
        match next_input(STAGE, &mut input, &output, &ctx.cancel).await {
            Next::Item(row) => {
                if !emit(&output, Envelope::Raw(row)).await {
                    return;
                }
            }
            Next::End | Next::Stop => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;
    use crate::executor::stream::testing::{collect, feed, file};
    use crate::executor::{CancelToken, ExecutorErrorCode};
    use crate::functions::FunctionRegistry;
    use crate::value::Value;
    use std::sync::Arc;

    fn ctx_with(env: Environment) -> StageContext {
        StageContext::new(env, Arc::new(FunctionRegistry::standard()), CancelToken::new())
    }

    fn ctx() -> StageContext {
        ctx_with(Environment::new())
    }

    fn grouped(out: Vec<Envelope>) -> Vec<GroupedRow> {
        out.into_iter()
            .map(|e| match e {
                Envelope::Grouped(g) => g,
                other => panic!("unexpected envelope {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_resolve_key() {
        let mut env = Environment::new();
        assert_eq!(resolve_key(&env, "size").unwrap(), "size");

        env.set_lazy("s", Expr::ident("size"));
        assert_eq!(resolve_key(&env, "s").unwrap(), "size");

        env.set_lazy("e", Expr::call("ext", vec![Expr::ident("name")]));
        assert_eq!(
            resolve_key(&env, "e").unwrap_err().code(),
            ExecutorErrorCode::InvalidIdentRef
        );

        env.set_value("v", Value::Int(1));
        assert_eq!(
            resolve_key(&env, "v").unwrap_err().code(),
            ExecutorErrorCode::InvalidIdentRef
        );
    }

    #[tokio::test]
    async fn test_partitions_by_column() {
        let rows = vec![file("a", 1), file("b", 1), file("c", 2)];
        let input = feed(rows.iter().cloned().map(Ok).collect());
        let groups = grouped(collect(Grouper::new("size").spawn(ctx(), input)).await);

        assert_eq!(groups.len(), 2);
        let one = groups.iter().find(|g| g.value == Value::Int(1)).unwrap();
        let two = groups.iter().find(|g| g.value == Value::Int(2)).unwrap();
        assert_eq!(one.key, "size");
        assert_eq!(one.members, vec![file("a", 1), file("b", 1)]);
        assert_eq!(two.members, vec![file("c", 2)]);

        let total: usize = groups.iter().map(|g| g.members.len()).sum();
        assert_eq!(total, rows.len());
    }

    #[tokio::test]
    async fn test_group_by_alias() {
        let mut env = Environment::new();
        env.set_lazy("s", Expr::ident("size"));
        let input = feed(vec![Ok(file("a", 1)), Ok(file("b", 1))]);
        let groups = grouped(collect(Grouper::new("s").spawn(ctx_with(env), input)).await);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "size");
    }

    #[tokio::test]
    async fn test_unknown_column_is_invalid_ident() {
        let input = feed(vec![Ok(file("a", 1))]);
        let out = collect(Grouper::new("owner").spawn(ctx(), input)).await;

        assert_eq!(out.len(), 1);
        match &out[0] {
            Envelope::Error(err) => assert_eq!(err.code(), ExecutorErrorCode::InvalidIdent),
            other => panic!("unexpected envelope {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pass_through_wraps_raw() {
        let input = feed(vec![Ok(file("a", 1)), Ok(file("b", 2))]);
        let out = collect(Grouper::pass_through().spawn(ctx(), input)).await;
        assert_eq!(out, vec![Envelope::Raw(file("a", 1)), Envelope::Raw(file("b", 2))]);
    }

    #[tokio::test]
    async fn test_upstream_error_emits_no_groups() {
        let upstream = ExecutorError::source_failed("x");
        let input = feed(vec![Ok(file("a", 1)), Err(upstream.clone())]);
        let out = collect(Grouper::new("size").spawn(ctx(), input)).await;
        assert_eq!(out, vec![Envelope::Error(upstream)]);
    }

    #[tokio::test]
    async fn test_pre_cancelled() {
        for grouper in [Grouper::new("size"), Grouper::pass_through()] {
            let ctx = ctx();
            ctx.cancel.cancel();
            let input = feed(vec![Ok(file("a", 1))]);
            let out = collect(grouper.spawn(ctx, input)).await;

            assert_eq!(out.len(), 1);
            assert!(matches!(&out[0], Envelope::Error(e) if e.is_cancelled()));
        }
    }
}
