//! End-to-End Tests
//!
//! Queries run over a real directory tree:
//! - Walk order, filters, grouping and aggregation together
//! - Multiple roots and missing roots
//! - CSV and JSON output through the CLI writers

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use dirql::cli::{execute, CliErrorCode, CsvRowWriter, JsonRowWriter};
use dirql::executor::{CancelToken, ExecutorErrorCode, FsSource, ProjectedRow, QueryRunner};
use dirql::parser::parse;
use dirql::value::Value;

// =============================================================================
// Helper Functions
// =============================================================================

/// root/
///   a.txt   (3 bytes)
///   b/
///     c.txt (10 bytes)
///     d.md  (1 byte)
fn tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.txt"), "abc").unwrap();
    fs::create_dir(dir.path().join("b")).unwrap();
    fs::write(dir.path().join("b").join("c.txt"), "0123456789").unwrap();
    fs::write(dir.path().join("b").join("d.md"), "#").unwrap();
    dir
}

fn runner(query: &str) -> QueryRunner {
    QueryRunner::new(parse(query).unwrap()).unwrap()
}

async fn run(query: &str, roots: Vec<PathBuf>) -> Vec<ProjectedRow> {
    let mut rx = runner(query).run(roots, CancelToken::new());
    let mut out = Vec::new();
    while let Some(item) = rx.recv().await {
        out.push(item);
    }
    out
}

async fn run_ok(query: &str, root: &Path) -> Vec<Vec<Value>> {
    run(query, vec![root.to_path_buf()])
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect()
}

fn s(v: &str) -> Value {
    Value::from(v)
}

// =============================================================================
// Query Tests
// =============================================================================

/// Files only, largest first.
#[tokio::test]
async fn test_filter_and_order() {
    let dir = tree();
    let out = run_ok(
        "select base(name), size where not is_dir order by size desc",
        dir.path(),
    )
    .await;
    assert_eq!(
        out,
        vec![
            vec![s("c.txt"), Value::Int(10)],
            vec![s("a.txt"), Value::Int(3)],
            vec![s("d.md"), Value::Int(1)],
        ]
    );
}

/// The walk is pre-order with siblings sorted, and LIMIT/OFFSET follow it.
#[tokio::test]
async fn test_walk_order_with_limit() {
    let dir = tree();
    let out = run_ok("select base(name) limit 3 offset 1", dir.path()).await;
    assert_eq!(out, vec![vec![s("a.txt")], vec![s("b")], vec![s("c.txt")]]);
}

/// Directories and files counted per group; false sorts before true.
#[tokio::test]
async fn test_group_by_is_dir() {
    let dir = tree();
    let out = run_ok(
        "select is_dir, count(name) group by is_dir order by is_dir",
        dir.path(),
    )
    .await;
    assert_eq!(
        out,
        vec![
            vec![Value::Bool(false), Value::Int(3)],
            vec![Value::Bool(true), Value::Int(2)],
        ]
    );
}

/// Whole-set aggregation over a filtered walk.
#[tokio::test]
async fn test_sum_of_text_files() {
    let dir = tree();
    let out = run_ok(
        "select sum(size), count(name) where ext(name) = \"txt\"",
        dir.path(),
    )
    .await;
    assert_eq!(out, vec![vec![Value::Int(13), Value::Int(2)]]);
}

/// `all` expands to every metadata column.
#[tokio::test]
async fn test_select_all() {
    let dir = tree();
    let out = run_ok("select all where base(name) = \"a.txt\"", dir.path()).await;
    assert_eq!(out.len(), 1);

    let row = &out[0];
    assert_eq!(row.len(), 5);
    assert_eq!(row[0], Value::String(dir.path().join("a.txt").display().to_string()));
    assert_eq!(row[1], Value::Int(3));
    assert!(matches!(&row[2], Value::String(mode) if mode.starts_with('-')));
    assert!(matches!(row[3], Value::Int(t) if t > 0));
    assert_eq!(row[4], Value::Bool(false));
}

/// DISTINCT keeps first occurrences in walk order.
#[tokio::test]
async fn test_distinct() {
    let dir = tree();
    let out = run_ok("select distinct is_dir", dir.path()).await;
    assert_eq!(out, vec![vec![Value::Bool(true)], vec![Value::Bool(false)]]);
}

/// Roots are walked in the order given; a file root yields itself.
#[tokio::test]
async fn test_multiple_roots() {
    let dir = tree();
    let roots = vec![dir.path().join("b"), dir.path().join("a.txt")];
    let out: Vec<Vec<Value>> = run("select base(name) where not is_dir", roots)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(out, vec![vec![s("c.txt")], vec![s("d.md")], vec![s("a.txt")]]);
}

/// A root that does not exist ends the stream with a source error.
#[tokio::test]
async fn test_missing_root() {
    let dir = tree();
    let out = run("select name", vec![dir.path().join("nope")]).await;
    assert_eq!(out.len(), 1);
    assert_eq!(
        out[0].as_ref().unwrap_err().code(),
        ExecutorErrorCode::SourceFailed
    );
}

// =============================================================================
// Output Tests
// =============================================================================

/// CSV with a header row named after the select terms.
#[tokio::test]
async fn test_csv_output() {
    let dir = tree();
    let runner = runner(
        "select base(name), size as bytes where (not is_dir) and size > 2 order by base(name)",
    );
    let source = FsSource::new([dir.path()]);
    let mut buf = Vec::new();
    {
        let mut writer = CsvRowWriter::new(&mut buf, runner.headers(), true).unwrap();
        let rows = execute(&runner, &source, CancelToken::new(), &mut writer)
            .await
            .unwrap();
        assert_eq!(rows, 2);
    }
    assert_eq!(
        String::from_utf8(buf).unwrap(),
        "base(name),bytes\na.txt,3\nc.txt,10\n"
    );
}

/// JSON lines keyed by header.
#[tokio::test]
async fn test_json_output() {
    let dir = tree();
    let runner = runner("select base(name) as file, size where ext(name) = \"md\"");
    let source = FsSource::new([dir.path()]);
    let mut buf = Vec::new();
    {
        let mut writer = JsonRowWriter::new(&mut buf, runner.headers());
        execute(&runner, &source, CancelToken::new(), &mut writer)
            .await
            .unwrap();
    }
    let line: serde_json::Value =
        serde_json::from_str(String::from_utf8(buf).unwrap().trim()).unwrap();
    assert_eq!(line, serde_json::json!({"file": "d.md", "size": 1}));
}

/// A failing query surfaces as a CLI error; rows written before it are kept.
#[tokio::test]
async fn test_cli_error_after_rows() {
    let dir = tree();
    // Walk order is a.txt, c.txt, d.md; d.md divides by zero
    let runner = runner("select base(name), 90 / (size - 1) where not is_dir");
    let source = FsSource::new([dir.path()]);
    let mut buf = Vec::new();
    let err = {
        let mut writer = CsvRowWriter::new(&mut buf, runner.headers(), false).unwrap();
        execute(&runner, &source, CancelToken::new(), &mut writer)
            .await
            .unwrap_err()
    };
    assert_eq!(err.code(), CliErrorCode::QueryFailed);
    assert!(err.message().contains("DIRQL_EVAL_FAILED"));
    assert_eq!(String::from_utf8(buf).unwrap(), "a.txt,45\nc.txt,10\n");
}
