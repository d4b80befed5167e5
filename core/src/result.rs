// opus/src/result.rs

//! The accumulator returned from every operation call.
//!
//! Two failure channels are kept apart: `errors` holds expected,
//! field-addressed domain failures (validations, explicit `add_error` calls)
//! while `exceptions` holds runtime faults caught at step boundaries, keyed by
//! `TypeName#step`. Either channel makes the result a failure.

use crate::error::{OpusError, OpusResult};
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Field -> ordered, deduplicated messages.
pub type ErrorMap = IndexMap<String, Vec<Value>>;

/// Qualified step identifier -> captured fault messages.
pub type ExceptionMap = IndexMap<String, Vec<String>>;

/// One entry of the execution trace.
///
/// Sub-operation entries nest the callee's trace under the calling step's
/// name, so the trace mirrors how operations were composed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Execution {
  Step(String),
  Operation { step: String, executions: Vec<Execution> },
  Operations { step: String, executions: Vec<Vec<Execution>> },
}

impl Execution {
  pub fn step(name: impl Into<String>) -> Self {
    Execution::Step(name.into())
  }

  /// Name of the step this entry was recorded for.
  pub fn name(&self) -> &str {
    match self {
      Execution::Step(step) | Execution::Operation { step, .. } | Execution::Operations { step, .. } => step,
    }
  }
}

impl From<&str> for Execution {
  fn from(name: &str) -> Self {
    Execution::step(name)
  }
}

impl Serialize for Execution {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      Execution::Step(step) => serializer.serialize_str(step),
      Execution::Operation { step, executions } => {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(step, executions)?;
        map.end()
      }
      Execution::Operations { step, executions } => {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(step, &Traces(executions))?;
        map.end()
      }
    }
  }
}

struct Traces<'a>(&'a [Vec<Execution>]);

impl Serialize for Traces<'_> {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
    for trace in self.0 {
      seq.serialize_element(trace)?;
    }
    seq.end()
  }
}

/// Outcome of one operation call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OperationResult {
  errors: ErrorMap,
  exceptions: ExceptionMap,
  information: Map<String, Value>,
  executions: Vec<Execution>,
  output: Value,
}

impl OperationResult {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_output(output: impl Into<Value>) -> Self {
    Self {
      output: output.into(),
      ..Self::default()
    }
  }

  pub fn is_failure(&self) -> bool {
    !self.errors.is_empty() || !self.exceptions.is_empty()
  }

  pub fn is_success(&self) -> bool {
    !self.is_failure()
  }

  pub fn errors(&self) -> &ErrorMap {
    &self.errors
  }

  pub fn exceptions(&self) -> &ExceptionMap {
    &self.exceptions
  }

  pub fn information(&self) -> &Map<String, Value> {
    &self.information
  }

  pub fn executions(&self) -> &[Execution] {
    &self.executions
  }

  pub fn output(&self) -> &Value {
    &self.output
  }

  pub fn output_mut(&mut self) -> &mut Value {
    &mut self.output
  }

  pub fn set_output(&mut self, output: impl Into<Value>) {
    self.output = output.into();
  }

  pub fn into_output(self) -> Value {
    self.output
  }

  /// Output of a successful result; a failed result has no output to give.
  pub fn output_checked(&self) -> OpusResult<&Value> {
    if self.is_failure() {
      return Err(OpusError::OutputOnFailure);
    }
    Ok(&self.output)
  }

  /// Errors and exceptions in a single map. Exception keys win on collision.
  pub fn failures(&self) -> ErrorMap {
    let mut combined = self.errors.clone();
    for (key, messages) in &self.exceptions {
      combined.insert(key.clone(), messages.iter().cloned().map(Value::String).collect());
    }
    combined
  }

  /// Adds `message` under `field`.
  ///
  /// Arrays are flattened into the field's list, an object is merged into an
  /// object already at the head of the list, and identical messages are kept
  /// once. `null` (or an empty array) adds nothing.
  pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<Value>) {
    let message = message.into();
    if message.is_null() {
      return;
    }

    let field = field.into();
    let messages = self.errors.entry(field.clone()).or_default();
    match message {
      Value::Object(incoming) => match messages.first_mut() {
        Some(Value::Object(existing)) => existing.extend(incoming),
        _ => messages.push(Value::Object(incoming)),
      },
      Value::Array(items) => messages.extend(items.into_iter().filter(|item| !item.is_null())),
      other => messages.push(other),
    }

    let mut seen: Vec<Value> = Vec::with_capacity(messages.len());
    messages.retain(|message| {
      if seen.contains(message) {
        false
      } else {
        seen.push(message.clone());
        true
      }
    });

    if messages.is_empty() {
      self.errors.shift_remove(&field);
    }
  }

  pub fn add_errors<I, K, V>(&mut self, errors: I)
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
  {
    for (field, message) in errors {
      self.add_error(field, message);
    }
  }

  /// Records a fault message under `classname#step` (or `step` when there is
  /// no class name). Repeated calls for the same key append.
  pub fn add_exception(&mut self, step: &str, message: impl Into<String>, classname: Option<&str>) {
    let key = match classname {
      Some(classname) => format!("{classname}#{step}"),
      None => step.to_string(),
    };
    self.exceptions.entry(key).or_default().push(message.into());
  }

  /// Merges already-qualified exception entries, appending to existing keys.
  pub fn add_exceptions<I, K>(&mut self, exceptions: I)
  where
    I: IntoIterator<Item = (K, Vec<String>)>,
    K: Into<String>,
  {
    for (key, messages) in exceptions {
      self.exceptions.entry(key.into()).or_default().extend(messages);
    }
  }

  /// Shallow merge; later keys overwrite earlier ones on collision.
  pub fn add_information<I>(&mut self, information: I)
  where
    I: IntoIterator<Item = (String, Value)>,
  {
    self.information.extend(information);
  }

  pub fn add_execution(&mut self, execution: impl Into<Execution>) {
    self.executions.push(execution.into());
  }

  /// Folds another result's errors and exceptions into this one.
  pub fn merge_failures(&mut self, other: &OperationResult) {
    self.add_errors(other.errors.clone());
    self.add_exceptions(other.exceptions.clone());
  }

  pub(crate) fn pop_execution(&mut self) -> Option<Execution> {
    self.executions.pop()
  }
}
