//! ORDER BY
//!
//! Materializes the input, evaluates the sort key once per item and sorts
//! stably. Every key must belong to the family of the first one: numbers
//! (int and float together), strings or bools.

use std::cmp::Ordering;

use tokio::sync::mpsc::{self, Receiver, Sender};

use crate::ast::{OrderBy, SortDirection};
use crate::eval::Evaluator;
use crate::ops::compare;
use crate::value::Value;

use super::errors::{ExecutorError, ExecutorResult};
use super::stream::{bind_envelope, emit, fail, next_input, Envelope, Next, StageContext};

const STAGE: &str = "order by";

/// The ORDER BY stage
pub struct ResultSorter {
    order: OrderBy,
}

impl ResultSorter {
    pub fn new(order: OrderBy) -> Self {
        Self { order }
    }

    pub fn spawn(self, ctx: StageContext, input: Receiver<Envelope>) -> Receiver<Envelope> {
        let (tx, rx) = mpsc::channel(ctx.capacity);
        tokio::spawn(self.run(ctx, input, tx));
        rx
    }

    async fn run(
        self,
        ctx: StageContext,
        mut input: Receiver<Envelope>,
        output: Sender<Envelope>,
    ) {
        let evaluator = Evaluator::new(&ctx.registry);
        let mut keyed: Vec<(Value, Envelope)> = Vec::new();
        loop {
            let envelope = match next_input(STAGE, &mut input, &output, &ctx.cancel).await {
                Next::Item(envelope) => envelope,
                Next::End => break,
                Next::Stop => return,
            };

            let Some(mut env) = bind_envelope(&ctx.env, &envelope) else {
                continue;
            };
            match evaluator.evaluate(&self.order.expr, &mut env) {
                Ok(key) => keyed.push((key, envelope)),
                Err(err) => return fail(STAGE, &output, err.into()).await,
            }
        }

        if let Err(err) = Self::sort(&mut keyed, self.order.direction) {
            return fail(STAGE, &output, err).await;
        }

        for (_, envelope) in keyed {
            if ctx.cancel.is_cancelled() {
                let _ = output.send(Envelope::Error(ExecutorError::cancelled(STAGE))).await;
                return;
            }
            if !emit(&output, envelope).await {
                return;
            }
        }
    }

    /// Sorts items by their keys.
    ///
    /// Sort is stable. Descending order swaps the comparator's arguments,
    /// so equal keys keep their input order in both directions.
    pub fn sort<T>(items: &mut [(Value, T)], direction: SortDirection) -> ExecutorResult<()> {
        if let Some((first, _)) = items.first() {
            let expected = KeyFamily::of(first);
            if let Some((key, _)) = items.iter().find(|(k, _)| KeyFamily::of(k) != expected) {
                return Err(ExecutorError::mixed_sort_keys(format!(
                    "first key is {} but found {} {}",
                    first.value_type(),
                    key.value_type(),
                    key
                )));
            }
        }

        items.sort_by(|(a, _), (b, _)| match direction {
            SortDirection::Asc => Self::compare_values(a, b),
            SortDirection::Desc => Self::compare_values(b, a),
        });
        Ok(())
    }

    /// Numbers numerically, strings lexicographically, false before true.
    /// NaN compares equal to everything.
    fn compare_values(a: &Value, b: &Value) -> Ordering {
        let ord = match (a, b) {
            (Value::Int(_), Value::Float(_)) | (Value::Float(_), Value::Int(_)) => {
                a.to_f64().zip(b.to_f64()).and_then(|(x, y)| x.partial_cmp(&y))
            }
            _ => compare::compare(a, b),
        };
        ord.unwrap_or(Ordering::Equal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyFamily {
    Number,
    String,
    Bool,
}

impl KeyFamily {
    fn of(key: &Value) -> Self {
        match key {
            Value::Int(_) | Value::Float(_) => KeyFamily::Number,
            Value::String(_) => KeyFamily::String,
            Value::Bool(_) => KeyFamily::Bool,
        }
    }
}
