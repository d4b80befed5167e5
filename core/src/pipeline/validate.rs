// opus/src/pipeline/validate.rs

//! The `validate` strategy.

use crate::core::operation::Operation;
use crate::core::step::{StepDef, StepValue};
use crate::error::{OpusError, OpusResult};
use crate::pipeline::execution::Executor;
use serde_json::Value;
use tracing::{event, Level};

impl<O: Operation> Executor<'_, O> {
  /// Runs `step` and folds its validation outcome into the result.
  ///
  /// A successful outcome becomes the step's output record; a failed one
  /// contributes its errors (and, for an `OperationResult`, its exceptions).
  /// Any other return shape is an authoring error and is raised.
  pub(super) fn run_validation(&mut self, step: &StepDef<O>) -> OpusResult<()> {
    let Some(value) = self.call_step(step)? else {
      return Ok(());
    };

    match value {
      StepValue::Result(outcome) => {
        if outcome.is_success() {
          self.record_output(step, outcome.into_output());
        } else {
          event!(Level::DEBUG, step = step.name.as_str(), num_errors = outcome.errors().len(), "Validation failed.");
          self.operation.result_mut().merge_failures(&outcome);
        }
      }
      StepValue::Validation(outcome) => {
        if outcome.is_success() {
          self.record_output(step, Value::Object(outcome.to_map()));
        } else {
          let errors = outcome.errors();
          event!(Level::DEBUG, step = step.name.as_str(), num_errors = errors.len(), "Validation failed.");
          self.operation.result_mut().add_errors(errors);
        }
      }
      other => {
        event!(Level::ERROR, step = step.name.as_str(), found = other.shape(), "Validate step returned an unrecognized outcome.");
        return Err(OpusError::UnrecognizedValidationOutcome {
          step: step.name.clone(),
          found: other.shape(),
        });
      }
    }
    Ok(())
  }
}
