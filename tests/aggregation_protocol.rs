//! Aggregation Protocol Tests
//!
//! Tests for how aggregation calls walk a column:
//! - The argument is evaluated once per row, in row order
//! - One call may read one column only
//! - Whole-set and per-group aggregation through a full query

use std::sync::{Arc, Mutex};

use dirql::env::Environment;
use dirql::eval::{EvalErrorKind, Evaluator};
use dirql::executor::{CancelToken, ExecutorErrorCode, FileRow, MemorySource, QueryRunner};
use dirql::functions::{Function, FunctionRegistry, FunctionResult};
use dirql::parser::{parse, parse_expr};
use dirql::value::Value;

// =============================================================================
// Helper Functions
// =============================================================================

/// Scalar function that records every argument it sees
struct Recorder {
    seen: Arc<Mutex<Vec<Value>>>,
}

impl Function for Recorder {
    fn name(&self) -> &'static str {
        "record"
    }

    fn call(&self, args: &[Value]) -> FunctionResult<Value> {
        self.seen.lock().unwrap().push(args[0].clone());
        Ok(args[0].clone())
    }
}

fn recording_registry() -> (FunctionRegistry, Arc<Mutex<Vec<Value>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let registry = FunctionRegistry::standard();
    registry
        .register(Arc::new(Recorder {
            seen: Arc::clone(&seen),
        }))
        .unwrap();
    (registry, seen)
}

fn column(values: &[i64]) -> Environment {
    let mut env = Environment::new();
    env.set_column("size", values.iter().copied().map(Value::Int).collect::<Vec<_>>());
    env
}

fn row(name: &str, size: i64) -> FileRow {
    FileRow {
        name: name.to_string(),
        size,
        mode: "-rw-r--r--".to_string(),
        mod_time: 0,
        is_dir: false,
    }
}

async fn query(text: &str, rows: Vec<FileRow>) -> Vec<Result<Vec<Value>, ExecutorErrorCode>> {
    let runner = QueryRunner::new(parse(text).unwrap()).unwrap();
    let source = MemorySource::new(rows);
    let mut rx = runner.run_with_source(&source, CancelToken::new());
    let mut out = Vec::new();
    while let Some(item) = rx.recv().await {
        out.push(item.map_err(|e| e.code()));
    }
    out
}

// =============================================================================
// Iteration Tests
// =============================================================================

/// sum(record(size)) visits each of the n rows exactly once, in index order.
#[test]
fn test_argument_evaluated_once_per_row_in_order() {
    let (registry, seen) = recording_registry();
    let expr = parse_expr("sum(record(size))").unwrap();
    let mut env = column(&[5, 3, 9, 1]);

    let total = Evaluator::new(&registry).evaluate(&expr, &mut env).unwrap();

    assert_eq!(total, Value::Int(18));
    assert_eq!(
        *seen.lock().unwrap(),
        vec![Value::Int(5), Value::Int(3), Value::Int(9), Value::Int(1)]
    );
}

/// An empty column never evaluates the argument.
#[test]
fn test_empty_column_evaluates_nothing() {
    let (registry, seen) = recording_registry();
    let expr = parse_expr("count(record(size))").unwrap();
    let mut env = column(&[]);

    let count = Evaluator::new(&registry).evaluate(&expr, &mut env).unwrap();

    assert_eq!(count, Value::Int(0));
    assert!(seen.lock().unwrap().is_empty());
}

/// Two aggregations in one expression each walk the column.
#[test]
fn test_each_call_walks_column_separately() {
    let (registry, seen) = recording_registry();
    let expr = parse_expr("max(record(size)) - min(record(size))").unwrap();
    let mut env = column(&[2, 7]);

    let spread = Evaluator::new(&registry).evaluate(&expr, &mut env).unwrap();

    assert_eq!(spread, Value::Int(5));
    assert_eq!(seen.lock().unwrap().len(), 4);
}

// =============================================================================
// Target Column Tests
// =============================================================================

/// Referencing two different columns inside one call fails.
#[test]
fn test_two_targets_in_one_call_fail() {
    let registry = FunctionRegistry::standard();
    let mut env = column(&[1, 2]);
    env.set_column("mod_time", vec![Value::Int(10), Value::Int(20)]);

    let expr = parse_expr("sum(size + mod_time)").unwrap();
    let err = Evaluator::new(&registry).evaluate(&expr, &mut env).unwrap_err();
    assert_eq!(err.kind(), EvalErrorKind::MixedAggregationTargets);

    // Same column twice is one target
    let expr = parse_expr("sum(size * size)").unwrap();
    let value = Evaluator::new(&registry).evaluate(&expr, &mut env).unwrap();
    assert_eq!(value, Value::Int(5));
}

/// A non-column identifier is a type error even when another column is read too.
#[test]
fn test_scalar_identifier_in_call_is_type_mismatch() {
    let registry = FunctionRegistry::standard();
    let mut env = Environment::new();
    env.set_column("mod_time", vec![Value::Int(10), Value::Int(20)]);
    env.set_value("size", Value::Int(1));

    let expr = parse_expr("avg(mod_time + size)").unwrap();
    let err = Evaluator::new(&registry).evaluate(&expr, &mut env).unwrap_err();
    assert_eq!(err.kind(), EvalErrorKind::TypeMismatch);
}

/// Aggregations do not nest.
#[test]
fn test_nested_aggregation_fails() {
    let registry = FunctionRegistry::standard();
    let expr = parse_expr("sum(count(size))").unwrap();
    let err = Evaluator::new(&registry)
        .evaluate(&expr, &mut column(&[1]))
        .unwrap_err();
    assert_eq!(err.kind(), EvalErrorKind::NestedAggregation);
}

// =============================================================================
// Query Tests
// =============================================================================

/// Without GROUP BY the whole input folds into one row.
#[tokio::test]
async fn test_whole_set_aggregation() {
    let out = query(
        "select sum(size) where size > 0",
        vec![row("a", 1), row("b", 3)],
    )
    .await;
    assert_eq!(out, vec![Ok(vec![Value::Int(4)])]);
}

/// With GROUP BY every group folds separately.
#[tokio::test]
async fn test_per_group_aggregation() {
    let rows = vec![row("/src/a.rs", 10), row("/src/b.md", 5), row("/src/c.rs", 10)];
    let out = query(
        "select size as s, count(name), max(name) group by s order by s",
        rows,
    )
    .await;
    assert_eq!(
        out,
        vec![
            Ok(vec![Value::Int(5), Value::Int(1), Value::from("/src/b.md")]),
            Ok(vec![Value::Int(10), Value::Int(2), Value::from("/src/c.rs")]),
        ]
    );
}

/// Grouping by an alias of a computed expression is rejected.
#[tokio::test]
async fn test_group_by_computed_alias_fails() {
    let out = query(
        "select ext(name) as e, count(name) group by e",
        vec![row("/src/a.rs", 1)],
    )
    .await;
    assert_eq!(out, vec![Err(ExecutorErrorCode::InvalidIdentRef)]);
}

/// HAVING filters on an aggregate bound by alias.
#[tokio::test]
async fn test_having_on_aggregate_alias() {
    let rows = vec![row("a", 1), row("b", 1), row("c", 2)];
    let out = query(
        "select size, count(name) as n group by size having n >= 2",
        rows,
    )
    .await;
    assert_eq!(out, vec![Ok(vec![Value::Int(1), Value::Int(2)])]);
}

/// The group key is a scalar inside its group, not an aggregation target.
#[tokio::test]
async fn test_group_key_inside_aggregation_fails() {
    let runner =
        QueryRunner::new(parse("select size, avg(mod_time + size) group by size").unwrap())
            .unwrap();
    let source = MemorySource::new(vec![row("a", 1), row("b", 1)]);
    let mut rx = runner.run_with_source(&source, CancelToken::new());

    let err = rx.recv().await.unwrap().unwrap_err();
    assert_eq!(err.code(), ExecutorErrorCode::EvalFailed);
    assert_eq!(err.eval_kind(), Some(EvalErrorKind::TypeMismatch));
    assert!(rx.recv().await.is_none());
}

/// WHERE runs before grouping, so aggregations are unknown there.
#[tokio::test]
async fn test_aggregation_in_where_fails() {
    let out = query("select name where sum(size) > 1", vec![row("a", 1)]).await;
    assert_eq!(out, vec![Err(ExecutorErrorCode::EvalFailed)]);
}

/// An aggregating query over no rows produces no rows.
#[tokio::test]
async fn test_aggregation_over_no_rows() {
    let out = query("select count(name) where size > 100", vec![row("a", 1)]).await;
    assert!(out.is_empty());
}
