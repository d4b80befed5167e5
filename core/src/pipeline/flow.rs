// opus/src/pipeline/flow.rs

//! `success` groups and `finish_if` predicates.

use crate::core::control::BreakPolicy;
use crate::core::operation::Operation;
use crate::core::step::StepDef;
use crate::error::OpusResult;
use crate::instruction::{Body, InstructionKind};
use crate::pipeline::execution::{Executor, Scope};
use tracing::{event, Level};

impl<O: Operation> Executor<'_, O> {
  /// Every member runs unless the operation finishes; the enclosing list
  /// applies its own break condition once the group is done.
  pub(super) fn run_success(&mut self, body: &Body<O>) -> OpusResult<()> {
    self.evaluate_body(body, Scope::new(BreakPolicy::FinishedOnly, InstructionKind::Step))
  }

  pub(super) fn run_finish_if(&mut self, step: &StepDef<O>) -> OpusResult<()> {
    let Some(value) = self.call_step(step)? else {
      return Ok(());
    };

    if value.is_truthy() {
      event!(Level::DEBUG, step = step.name.as_str(), "Finish condition met.");
      self.operation.finish();
    }
    Ok(())
  }
}
