//! CLI command implementations

use std::io;

use serde_json::{json, Value as JsonValue};

use crate::executor::{CancelToken, FsSource, QueryRunner, RowSource};
use crate::observability::{log_event_with_fields, Event, Logger, ObservationScope};
use crate::parser::parse;

use super::args::{Command, RunArgs};
use super::config::Config;
use super::errors::{CliError, CliErrorCode, CliResult};
use super::io::{row_writer, write_json, RowWriter};

/// Dispatch a parsed command
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Run(args) => run(args),
        Command::Explain { query } => explain(&query),
    }
}

/// `dirql run`: walk the roots and write every result row to stdout
pub fn run(args: RunArgs) -> CliResult<()> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    }
    .with_overrides(&args);
    config.validate()?;
    Logger::set_min_severity(config.severity()?);
    if let Some(path) = &args.config {
        let path = path.display().to_string();
        log_event_with_fields(Event::ConfigLoaded, &[("path", path.as_str())]);
    }

    let runner =
        QueryRunner::new(parse(&args.query)?)?.with_channel_capacity(config.channel_capacity);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let stdout = io::stdout();
    let mut writer = row_writer(config.format, stdout.lock(), runner.headers(), config.headers)?;

    runtime.block_on(async {
        let cancel = CancelToken::new();
        let interrupt = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            })
        };
        let source = FsSource::new(args.paths.iter().cloned());
        let result = execute(&runner, &source, cancel, writer.as_mut()).await;
        interrupt.abort();
        result.map(|_| ())
    })
}

/// Drains a run into `writer` and returns the number of rows written.
///
/// Stops at the first error item; the abandoned pipeline shuts down once
/// its output channel is dropped.
pub async fn execute(
    runner: &QueryRunner,
    source: &dyn RowSource,
    cancel: CancelToken,
    writer: &mut dyn RowWriter,
) -> CliResult<u64> {
    let headers = runner.headers().join(",");
    let scope = ObservationScope::with_fields("RUN", &[("headers", headers.as_str())]);

    let mut results = runner.run_with_source(source, cancel.clone());
    let mut rows: u64 = 0;
    let outcome = loop {
        match results.recv().await {
            None => break writer.finish(),
            Some(Ok(values)) => {
                if let Err(err) = writer.write_row(&values) {
                    break Err(err);
                }
                rows += 1;
            }
            Some(Err(err)) => break Err(CliError::from(err)),
        }
    };

    let count = rows.to_string();
    match outcome {
        Ok(()) => {
            log_event_with_fields(Event::QueryComplete, &[("rows", count.as_str())]);
            scope.complete_with_fields(&[("rows", count.as_str())]);
            Ok(rows)
        }
        Err(err) => {
            cancel.cancel();
            let _ = writer.finish();
            let event = match err.code() {
                CliErrorCode::Cancelled => Event::QueryCancelled,
                _ => Event::QueryFailed,
            };
            log_event_with_fields(
                event,
                &[("code", err.code_str()), ("reason", err.message()), ("rows", count.as_str())],
            );
            scope.fail(err.message());
            Err(err)
        }
    }
}

/// `dirql explain`: print the parsed statement as JSON
pub fn explain(query: &str) -> CliResult<()> {
    let document = explain_document(query)?;
    write_json(io::stdout().lock(), &document)
}

/// The statement after preprocessing, its headers, and whether it aggregates
pub fn explain_document(query: &str) -> CliResult<JsonValue> {
    let runner = QueryRunner::new(parse(query)?)?;
    Ok(json!({
        "statement": runner.statement(),
        "headers": runner.headers(),
        "aggregation": runner.is_aggregation(),
    }))
}
