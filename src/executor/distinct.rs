//! SELECT DISTINCT
//!
//! Drops projected rows equal to one already emitted. First occurrences keep
//! their order.

use std::collections::HashSet;

use tokio::sync::mpsc::{self, Receiver, Sender};

use super::stream::{emit, next_input, Next, ProjectedRow, StageContext, ValueKey};

const STAGE: &str = "distinct";

/// The DISTINCT stage
#[derive(Debug, Default)]
pub struct Deduplicator;

impl Deduplicator {
    pub fn new() -> Self {
        Self
    }

    pub fn spawn(self, ctx: StageContext, input: Receiver<ProjectedRow>) -> Receiver<ProjectedRow> {
        let (tx, rx) = mpsc::channel(ctx.capacity);
        tokio::spawn(Self::run(ctx, input, tx));
        rx
    }

    async fn run(
        ctx: StageContext,
        mut input: Receiver<ProjectedRow>,
        output: Sender<ProjectedRow>,
    ) {
        let mut seen: HashSet<Vec<ValueKey>> = HashSet::new();
        loop {
            let values = match next_input(STAGE, &mut input, &output, &ctx.cancel).await {
                Next::Item(values) => values,
                Next::End | Next::Stop => return,
            };
            if !seen.insert(values.iter().map(ValueKey::from).collect()) {
                continue;
            }
            if !emit(&output, Ok(values)).await {
                return;
            }
        }
    }
}
