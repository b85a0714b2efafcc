//! Items passed between pipeline stages
//!
//! The source produces `RowItem`s, GroupBy turns them into `Envelope`s, and
//! Select produces `ProjectedRow`s. An error item ends its stream: the
//! receiving stage forwards it once and stops.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc::{Receiver, Sender};

use crate::env::Environment;
use crate::functions::FunctionRegistry;
use crate::observability::{log_event_with_fields, Event};
use crate::value::Value;

use super::cancel::CancelToken;
use super::errors::{ExecutorError, ExecutorResult};

/// Metadata column names, in projection order
pub const COLUMNS: [&str; 5] = ["name", "size", "mode", "mod_time", "is_dir"];

/// Queue length between two stages
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// What every stage needs besides its own parameters
#[derive(Clone)]
pub struct StageContext {
    /// Base bindings, cloned per item
    pub env: Environment,
    pub registry: Arc<FunctionRegistry>,
    pub cancel: CancelToken,
    pub capacity: usize,
}

impl StageContext {
    pub fn new(env: Environment, registry: Arc<FunctionRegistry>, cancel: CancelToken) -> Self {
        Self {
            env,
            registry,
            cancel,
            capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Same context evaluating with another registry
    pub fn with_registry(mut self, registry: Arc<FunctionRegistry>) -> Self {
        self.registry = registry;
        self
    }
}

/// One filesystem entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRow {
    pub name: String,
    pub size: i64,
    pub mode: String,
    pub mod_time: i64,
    pub is_dir: bool,
}

impl FileRow {
    /// Value of a metadata column
    pub fn get(&self, column: &str) -> Option<Value> {
        match column {
            "name" => Some(Value::String(self.name.clone())),
            "size" => Some(Value::Int(self.size)),
            "mode" => Some(Value::String(self.mode.clone())),
            "mod_time" => Some(Value::Int(self.mod_time)),
            "is_dir" => Some(Value::Bool(self.is_dir)),
            _ => None,
        }
    }

    /// All columns paired with their names
    pub fn values(&self) -> [(&'static str, Value); 5] {
        [
            ("name", Value::String(self.name.clone())),
            ("size", Value::Int(self.size)),
            ("mode", Value::String(self.mode.clone())),
            ("mod_time", Value::Int(self.mod_time)),
            ("is_dir", Value::Bool(self.is_dir)),
        ]
    }
}

/// Rows sharing one value of the grouping column
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedRow {
    pub key: String,
    pub value: Value,
    pub members: Vec<FileRow>,
}

/// An item between GroupBy and Select
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Raw(FileRow),
    Grouped(GroupedRow),
    Error(ExecutorError),
}

/// An item between the source and GroupBy
pub type RowItem = ExecutorResult<FileRow>;

/// Pipeline output: projected values in header order
pub type ProjectedRow = ExecutorResult<Vec<Value>>;

/// Items that can carry a terminal error
pub trait StreamItem: Send + 'static {
    type Data: Send;

    fn from_error(err: ExecutorError) -> Self;

    fn into_data(self) -> ExecutorResult<Self::Data>;
}

impl<T: Send + 'static> StreamItem for ExecutorResult<T> {
    type Data = T;

    fn from_error(err: ExecutorError) -> Self {
        Err(err)
    }

    fn into_data(self) -> ExecutorResult<T> {
        self
    }
}

impl StreamItem for Envelope {
    type Data = Envelope;

    fn from_error(err: ExecutorError) -> Self {
        Envelope::Error(err)
    }

    fn into_data(self) -> ExecutorResult<Envelope> {
        match self {
            Envelope::Error(err) => Err(err),
            other => Ok(other),
        }
    }
}

pub(crate) enum Next<T> {
    Item(T),
    /// Input closed normally
    End,
    /// The stage must stop; the reason has already been sent downstream
    Stop,
}

/// Reads the next input item.
///
/// Cancellation is checked before reading. A cancelled run or an error
/// item is reported downstream once and turned into `Next::Stop`.
pub(crate) async fn next_input<I: StreamItem, O: StreamItem>(
    stage: &'static str,
    input: &mut Receiver<I>,
    output: &Sender<O>,
    cancel: &CancelToken,
) -> Next<I::Data> {
    if cancel.is_cancelled() {
        let _ = output.send(O::from_error(ExecutorError::cancelled(stage))).await;
        return Next::Stop;
    }
    match input.recv().await {
        None => Next::End,
        Some(item) => match item.into_data() {
            Ok(data) => Next::Item(data),
            Err(err) => {
                let _ = output.send(O::from_error(err)).await;
                Next::Stop
            }
        },
    }
}

/// Sends `item`, returning false once downstream is gone
pub(crate) async fn emit<O: StreamItem>(output: &Sender<O>, item: O) -> bool {
    output.send(item).await.is_ok()
}

/// Reports a stage's own failure downstream
pub(crate) async fn fail<O: StreamItem>(
    stage: &'static str,
    output: &Sender<O>,
    err: ExecutorError,
) {
    let err = err.in_stage(stage);
    log_event_with_fields(
        Event::StageFailed,
        &[("stage", stage), ("code", err.code().code()), ("reason", err.message())],
    );
    let _ = output.send(O::from_error(err)).await;
}

/// Hashable stand-in for a `Value`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ValueKey {
    Int(i64),
    Float(u64),
    String(String),
    Bool(bool),
}

impl From<&Value> for ValueKey {
    fn from(v: &Value) -> Self {
        match v {
            Value::Int(i) => ValueKey::Int(*i),
            Value::Float(f) => ValueKey::Float(f.to_bits()),
            Value::String(s) => ValueKey::String(s.clone()),
            Value::Bool(b) => ValueKey::Bool(*b),
        }
    }
}

/// Environment for one row: every column bound to its scalar
pub fn bind_row(base: &Environment, row: &FileRow) -> Environment {
    let mut env = base.clone();
    for (name, value) in row.values() {
        env.set_value(name, value);
    }
    env
}

/// Environment for one group: the key bound to the group's value, every
/// other column bound to the members' values
pub fn bind_group(base: &Environment, group: &GroupedRow) -> Environment {
    let mut env = bind_columns(base, &group.members, Some(group.key.as_str()));
    env.set_value(&group.key, group.value.clone());
    env
}

/// Environment over a whole row set: every column bound as a column
pub fn bind_rows(base: &Environment, rows: &[FileRow]) -> Environment {
    bind_columns(base, rows, None)
}

/// Environment for any non-error envelope
pub fn bind_envelope(base: &Environment, envelope: &Envelope) -> Option<Environment> {
    match envelope {
        Envelope::Raw(row) => Some(bind_row(base, row)),
        Envelope::Grouped(group) => Some(bind_group(base, group)),
        Envelope::Error(_) => None,
    }
}

fn bind_columns(base: &Environment, rows: &[FileRow], skip: Option<&str>) -> Environment {
    let mut columns: HashMap<&'static str, Vec<Value>> = COLUMNS
        .iter()
        .filter(|name| skip != Some(**name))
        .map(|name| (*name, Vec::with_capacity(rows.len())))
        .collect();
    for row in rows {
        for (name, value) in row.values() {
            if let Some(column) = columns.get_mut(name) {
                column.push(value);
            }
        }
    }

    let mut env = base.clone();
    for (name, values) in columns {
        env.set_column(name, values);
    }
    env
}
