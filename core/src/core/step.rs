// opus/src/core/step.rs

//! Defines a single named step and the values a step handler may hand back.

use crate::backend::validation::{Validation, ValidationOutcome};
use crate::result::OperationResult;
use serde_json::Value;
use std::sync::Arc;

/// Type alias for a step handler.
///
/// Handlers receive the live operation instance. An `Err` is a runtime fault:
/// the executor records it in the result's `exceptions` and carries on as if
/// the step had failed. Handlers are shared by every call of the operation type.
pub type StepHandler<O> = Arc<dyn Fn(&mut O) -> anyhow::Result<StepValue> + Send + Sync + 'static>;

/// A named step: the leaf unit of every instruction tree.
pub struct StepDef<O: 'static> {
  pub name: String,
  handler: StepHandler<O>,
}

impl<O: 'static> StepDef<O> {
  pub fn new<F, R>(name: impl Into<String>, handler: F) -> Self
  where
    F: Fn(&mut O) -> anyhow::Result<R> + Send + Sync + 'static,
    R: Into<StepValue>,
  {
    Self {
      name: name.into(),
      handler: Arc::new(move |operation: &mut O| handler(operation).map(Into::into)),
    }
  }

  pub(crate) fn invoke(&self, operation: &mut O) -> anyhow::Result<StepValue> {
    (self.handler)(operation)
  }
}

impl<O: 'static> Clone for StepDef<O> {
  fn clone(&self) -> Self {
    Self {
      name: self.name.clone(),
      handler: Arc::clone(&self.handler),
    }
  }
}

// The handler is an opaque closure; only the name is worth printing.
impl<O: 'static> std::fmt::Debug for StepDef<O> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef").field("name", &self.name).finish()
  }
}

/// What a step handler returned.
///
/// Plain steps ignore it. `validate`, `operation`, `operations` and `finish_if`
/// each accept specific shapes and treat anything else as an authoring error
/// (except `finish_if`, which only looks at truthiness).
pub enum StepValue {
  Unit,
  Bool(bool),
  Value(Value),
  Result(OperationResult),
  Results(Vec<OperationResult>),
  Validation(Box<dyn ValidationOutcome>),
}

impl StepValue {
  pub fn validation(outcome: impl ValidationOutcome + 'static) -> Self {
    StepValue::Validation(Box::new(outcome))
  }

  /// `Unit`, `false` and `null` are falsy; everything else is truthy.
  pub fn is_truthy(&self) -> bool {
    match self {
      StepValue::Unit => false,
      StepValue::Bool(flag) => *flag,
      StepValue::Value(value) => !matches!(value, Value::Null | Value::Bool(false)),
      StepValue::Result(_) | StepValue::Results(_) | StepValue::Validation(_) => true,
    }
  }

  pub(crate) fn shape(&self) -> &'static str {
    match self {
      StepValue::Unit => "nothing",
      StepValue::Bool(_) => "a bool",
      StepValue::Value(_) => "a plain value",
      StepValue::Result(_) => "an OperationResult",
      StepValue::Results(_) => "a Vec of OperationResult",
      StepValue::Validation(_) => "a validation outcome",
    }
  }
}

impl std::fmt::Debug for StepValue {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      StepValue::Unit => f.write_str("Unit"),
      StepValue::Bool(flag) => f.debug_tuple("Bool").field(flag).finish(),
      StepValue::Value(value) => f.debug_tuple("Value").field(value).finish(),
      StepValue::Result(result) => f.debug_tuple("Result").field(result).finish(),
      StepValue::Results(results) => f.debug_tuple("Results").field(results).finish(),
      StepValue::Validation(outcome) => f
        .debug_struct("Validation")
        .field("success", &outcome.is_success())
        .finish(),
    }
  }
}

impl From<()> for StepValue {
  fn from(_: ()) -> Self {
    StepValue::Unit
  }
}

impl From<bool> for StepValue {
  fn from(flag: bool) -> Self {
    StepValue::Bool(flag)
  }
}

impl From<Value> for StepValue {
  fn from(value: Value) -> Self {
    StepValue::Value(value)
  }
}

impl From<String> for StepValue {
  fn from(value: String) -> Self {
    StepValue::Value(Value::String(value))
  }
}

impl From<&str> for StepValue {
  fn from(value: &str) -> Self {
    StepValue::Value(Value::String(value.to_string()))
  }
}

impl From<OperationResult> for StepValue {
  fn from(result: OperationResult) -> Self {
    StepValue::Result(result)
  }
}

impl From<Vec<OperationResult>> for StepValue {
  fn from(results: Vec<OperationResult>) -> Self {
    StepValue::Results(results)
  }
}

impl From<Validation> for StepValue {
  fn from(validation: Validation) -> Self {
    StepValue::validation(validation)
  }
}

impl<T: Into<StepValue>> From<Option<T>> for StepValue {
  fn from(value: Option<T>) -> Self {
    value.map_or(StepValue::Unit, Into::into)
  }
}
