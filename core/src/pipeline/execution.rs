// opus/src/pipeline/execution.rs

//! Contains the `Executor`, the interpreter that walks an operation's
//! instruction tree for one call.
//!
//! The executor never mutates instructions. The kind a plain `step` leaf
//! should take (validation, sub-operation, predicate, ...) is carried in a
//! [`Scope`] down the recursive walk, together with the break policy of the
//! list currently being walked.

use crate::config::{Config, InstrumentationLevel};
use crate::core::control::BreakPolicy;
use crate::core::operation::Operation;
use crate::core::step::{StepDef, StepValue};
use crate::error::{OpusError, OpusResult};
use crate::instruction::{Body, Instruction, InstructionKind};
use crate::result::Execution;
use anyhow::anyhow;
use serde_json::Value;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{event, span, Level};

/// Break policy of the list being walked plus the effective kind of its
/// plain `step` leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Scope {
  pub(crate) policy: BreakPolicy,
  pub(crate) leaf: InstructionKind,
}

impl Scope {
  pub(crate) const ROOT: Scope = Scope {
    policy: BreakPolicy::FinishedOrFailure,
    leaf: InstructionKind::Step,
  };

  pub(crate) fn new(policy: BreakPolicy, leaf: InstructionKind) -> Self {
    Self { policy, leaf }
  }
}

/// Interpreter state for one call. Borrows the live instance and the
/// configuration it was called with.
pub(crate) struct Executor<'a, O: Operation> {
  pub(super) operation: &'a mut O,
  pub(super) config: &'a Config,
  pub(super) name: Option<&'static str>,
}

impl<'a, O: Operation> Executor<'a, O> {
  pub(crate) fn new(operation: &'a mut O, config: &'a Config) -> Self {
    Self {
      operation,
      config,
      name: O::NAME,
    }
  }

  /// Walks `instructions` in order, stopping after the first one that leaves
  /// the operation in a state the scope's policy breaks on.
  pub(crate) fn evaluate_instructions(&mut self, instructions: &[Instruction<O>], scope: Scope) -> OpusResult<()> {
    for (index, instruction) in instructions.iter().enumerate() {
      self.evaluate_instruction(instruction, scope.leaf)?;

      let finished = self.operation.is_finished();
      let failed = self.operation.result().is_failure();
      if scope.policy.should_break(finished, failed) {
        event!(
          Level::DEBUG,
          index,
          remaining = instructions.len() - index - 1,
          finished,
          failed,
          "Break condition met; skipping remaining instructions."
        );
        break;
      }
    }
    Ok(())
  }

  /// Dispatches one node by kind. `leaf` is the effective kind of a plain
  /// `step` leaf in the enclosing scope.
  pub(crate) fn evaluate_instruction(&mut self, instruction: &Instruction<O>, leaf: InstructionKind) -> OpusResult<()> {
    let body = instruction.body();
    match instruction.kind() {
      InstructionKind::Step => match body {
        Body::Step(step) => self.evaluate_leaf(step, leaf),
        Body::Block(children) => self.evaluate_instructions(children, Scope::new(BreakPolicy::FinishedOrFailure, leaf)),
      },
      InstructionKind::Validate => self.evaluate_body(body, Scope::new(BreakPolicy::FinishedOnly, InstructionKind::Validate)),
      InstructionKind::Operation => self.evaluate_body(body, Scope::new(BreakPolicy::FinishedOrFailure, InstructionKind::Operation)),
      InstructionKind::Operations => self.evaluate_body(body, Scope::new(BreakPolicy::FinishedOrFailure, InstructionKind::Operations)),
      InstructionKind::FinishIf => self.evaluate_body(body, Scope::new(BreakPolicy::FinishedOrFailure, InstructionKind::FinishIf)),
      InstructionKind::Transaction => self.run_transaction(body),
      InstructionKind::Benchmark => self.run_benchmark(body),
      InstructionKind::Success => self.run_success(body),
    }
  }

  /// A single step takes `scope.leaf`; a block is walked under `scope`.
  pub(super) fn evaluate_body(&mut self, body: &Body<O>, scope: Scope) -> OpusResult<()> {
    match body {
      Body::Step(step) => self.evaluate_leaf(step, scope.leaf),
      Body::Block(children) => self.evaluate_instructions(children, scope),
    }
  }

  fn evaluate_leaf(&mut self, step: &StepDef<O>, kind: InstructionKind) -> OpusResult<()> {
    match kind {
      InstructionKind::Validate => self.run_validation(step),
      InstructionKind::Operation => self.run_operation(step),
      InstructionKind::Operations => self.run_operations(step),
      InstructionKind::FinishIf => self.run_finish_if(step),
      InstructionKind::Step | InstructionKind::Transaction | InstructionKind::Benchmark | InstructionKind::Success => {
        self.call_step(step)?;
        Ok(())
      }
    }
  }

  /// Runs one step handler inside step-level instrumentation.
  ///
  /// Returns `Ok(None)` when the handler faulted (the fault is recorded) or
  /// when the instrumentation backend skipped the step. A panic in the
  /// handler is a fault like any other. An authoring error coming back from
  /// a nested `call` is raised.
  pub(super) fn call_step(&mut self, step: &StepDef<O>) -> OpusResult<Option<StepValue>> {
    let step_span = span!(Level::DEBUG, "opus_step", step = step.name.as_str());
    let _step_span_guard = step_span.enter();

    let config = self.config;
    let traces = config.traces_executions();
    let operation = &mut *self.operation;
    let trace_name = format!("#{}", step.name);

    let outcome = config.instrument(&trace_name, InstrumentationLevel::Step, || {
      if traces {
        operation.result_mut().add_execution(step.name.as_str());
      }
      panic::catch_unwind(AssertUnwindSafe(|| step.invoke(&mut *operation)))
        .unwrap_or_else(|payload| Err(anyhow!("step panicked: {}", panic_message(&*payload))))
    });
    let Some(outcome) = outcome else {
      return Ok(None);
    };

    match outcome {
      Ok(value) => {
        event!(Level::TRACE, returned = ?value, "Step completed.");
        Ok(Some(value))
      }
      Err(fault) => {
        let fault = match fault.downcast::<OpusError>() {
          Ok(error) if error.is_authoring_error() => {
            event!(Level::ERROR, step = step.name.as_str(), %error, "Nested operation raised an authoring error.");
            return Err(error);
          }
          Ok(error) => anyhow::Error::new(error),
          Err(fault) => fault,
        };
        self.record_fault(&step.name, &fault);
        Ok(None)
      }
    }
  }

  /// Reports a caught runtime fault and records it under the step's
  /// qualified key.
  pub(super) fn record_fault(&mut self, step: &str, fault: &anyhow::Error) {
    event!(Level::ERROR, step, error = %format!("{fault:#}"), "Step raised a runtime fault; recording it.");

    if let Some(reporter) = &self.config.reporter {
      let reported = panic::catch_unwind(AssertUnwindSafe(|| reporter.error(fault)));
      if reported.is_err() {
        event!(Level::WARN, step, "Reporter panicked while reporting a fault; ignoring.");
      }
    }

    self
      .operation
      .result_mut()
      .add_exception(step, fault.to_string(), self.name);
  }

  /// Stores a per-step output record in the context.
  pub(super) fn record_output(&mut self, step: &StepDef<O>, output: Value) {
    self.operation.context_mut().record_output(&step.name, output);
  }

  /// Replaces the flat trace entry the step just appended with `nested`.
  pub(super) fn nest_trace_entry(&mut self, step: &str, nested: Execution) {
    if !self.config.traces_executions() {
      return;
    }

    let result = self.operation.result_mut();
    let flat = matches!(result.executions().last(), Some(Execution::Step(last)) if last == step);
    if flat {
      result.pop_execution();
    }
    result.add_execution(nested);
  }

  pub(super) fn operation_name(&self) -> String {
    self.name.unwrap_or_else(std::any::type_name::<O>).to_string()
  }
}

/// Text of a panic payload raised by `panic!` or the runtime.
fn panic_message(payload: &(dyn Any + Send)) -> &str {
  if let Some(message) = payload.downcast_ref::<&str>() {
    message
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.as_str()
  } else {
    "non-string panic payload"
  }
}
