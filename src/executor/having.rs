//! HAVING filtering over groups

use tokio::sync::mpsc::{self, Receiver, Sender};

use crate::ast::Expr;
use crate::eval::Evaluator;

use super::errors::ExecutorError;
use super::filters::check_condition;
use super::stream::{bind_group, emit, fail, next_input, Envelope, Next, StageContext};

const STAGE: &str = "having";

/// The HAVING stage. Only accepts grouped input.
pub struct HavingFilter {
    condition: Expr,
}

impl HavingFilter {
    pub fn new(condition: Expr) -> Self {
        Self { condition }
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
        loop {
            let group = match next_input(STAGE, &mut input, &output, &ctx.cancel).await {
                Next::Item(Envelope::Grouped(group)) => group,
                Next::Item(_) => {
                    let err = ExecutorError::invalid_having("input is not grouped");
                    return fail(STAGE, &output, err).await;
                }
                Next::End | Next::Stop => return,
            };

            let mut env = bind_group(&ctx.env, &group);
            match check_condition(&evaluator, &self.condition, &mut env) {
                Ok(true) => {
                    if !emit(&output, Envelope::Grouped(group)).await {
                        return;
                    }
                }
                Ok(false) => {}
                Err(err) => return fail(STAGE, &output, err).await,
            }
        }
    }
}
