// opus/src/pipeline/sub_operation.rs

//! The `operation` and `operations` strategies: steps that call other
//! operations and hand back their results.

use crate::core::operation::Operation;
use crate::core::step::{StepDef, StepValue};
use crate::error::{OpusError, OpusResult};
use crate::pipeline::execution::Executor;
use crate::result::{Execution, OperationResult};
use serde_json::Value;
use tracing::{event, Level};

impl<O: Operation> Executor<'_, O> {
  pub(super) fn run_operation(&mut self, step: &StepDef<O>) -> OpusResult<()> {
    let Some(value) = self.call_step(step)? else {
      return Ok(());
    };

    let outcome = match value {
      StepValue::Result(outcome) => outcome,
      other => {
        event!(Level::ERROR, step = step.name.as_str(), found = other.shape(), "Operation step returned the wrong shape.");
        return Err(OpusError::WrongOperationResult {
          step: step.name.clone(),
          found: other.shape(),
        });
      }
    };

    self.operation.result_mut().add_information(outcome.information().clone());

    if outcome.is_success() {
      let nested = Execution::Operation {
        step: step.name.clone(),
        executions: outcome.executions().to_vec(),
      };
      self.nest_trace_entry(&step.name, nested);
      self.record_output(step, outcome.into_output());
    } else {
      event!(Level::DEBUG, step = step.name.as_str(), "Sub-operation failed; merging its failures.");
      self.operation.result_mut().merge_failures(&outcome);
    }
    Ok(())
  }

  /// Like `run_operation` over a list: any failing element blocks the output
  /// record and contributes its failures; otherwise the outputs and traces
  /// are recorded in order.
  pub(super) fn run_operations(&mut self, step: &StepDef<O>) -> OpusResult<()> {
    let Some(value) = self.call_step(step)? else {
      return Ok(());
    };

    let outcomes = match value {
      StepValue::Results(outcomes) => outcomes,
      other => {
        event!(Level::ERROR, step = step.name.as_str(), found = other.shape(), "Operations step returned the wrong shape.");
        return Err(OpusError::WrongOperationsResult {
          step: step.name.clone(),
          found: other.shape(),
        });
      }
    };

    let failures: Vec<&OperationResult> = outcomes.iter().filter(|outcome| outcome.is_failure()).collect();
    if !failures.is_empty() {
      event!(
        Level::DEBUG,
        step = step.name.as_str(),
        num_failures = failures.len(),
        num_results = outcomes.len(),
        "Sub-operations failed; merging their failures."
      );
      let result = self.operation.result_mut();
      for failure in failures {
        result.merge_failures(failure);
      }
      return Ok(());
    }

    let nested = Execution::Operations {
      step: step.name.clone(),
      executions: outcomes.iter().map(|outcome| outcome.executions().to_vec()).collect(),
    };
    self.nest_trace_entry(&step.name, nested);

    let outputs = outcomes.into_iter().map(OperationResult::into_output).collect();
    self.record_output(step, Value::Array(outputs));
    Ok(())
  }
}
