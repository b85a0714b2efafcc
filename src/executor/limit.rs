//! LIMIT / OFFSET
//!
//! Forwards items whose zero-based position falls in `[offset, offset + limit)`.
//! Reading continues past the window so upstream stages always run to
//! completion.

use tokio::sync::mpsc::{self, Receiver, Sender};

use super::errors::ExecutorError;
use super::stream::{emit, fail, next_input, Envelope, Next, StageContext};

const STAGE: &str = "limit";

/// The LIMIT stage
#[derive(Debug, Clone, Copy)]
pub struct Limiter {
    limit: i64,
    offset: i64,
}

impl Limiter {
    pub fn new(limit: i64, offset: Option<i64>) -> Self {
        Self {
            limit,
            offset: offset.unwrap_or(0),
        }
    }

    /// True if `position` is inside the window
    pub fn contains(&self, position: i64) -> bool {
        position >= self.offset && position - self.offset < self.limit
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
        if ctx.cancel.is_cancelled() {
            let _ = output.send(Envelope::Error(ExecutorError::cancelled(STAGE))).await;
            return;
        }
        if self.limit < 1 || self.offset < 0 {
            let err = ExecutorError::invalid_limit(self.limit, self.offset);
            return fail(STAGE, &output, err).await;
        }

        let mut position: i64 = 0;
        loop {
            let envelope = match next_input(STAGE, &mut input, &output, &ctx.cancel).await {
                Next::Item(envelope) => envelope,
                Next::End | Next::Stop => return,
            };
            if self.contains(position) && !emit(&output, envelope).await {
                return;
            }
            position += 1;
        }
    }
}
