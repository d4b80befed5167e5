// opus/src/backend/validation.rs

//! Defines the contract a validation library's result must satisfy to be
//! returned from a `validate` step, plus a minimal built-in implementation.

use crate::result::ErrorMap;
use serde_json::{Map, Value};

/// A pass/fail validation outcome.
///
/// On failure the engine merges `errors()` into the operation's result; on
/// success `to_map()` becomes the step's recorded output.
pub trait ValidationOutcome {
  fn is_success(&self) -> bool;

  fn errors(&self) -> ErrorMap;

  fn to_map(&self) -> Map<String, Value>;
}

/// Checked values plus any field errors found while checking them.
///
/// ```
/// use opus::Validation;
/// use opus::ValidationOutcome;
/// use serde_json::json;
///
/// let mut values = serde_json::Map::new();
/// values.insert("age".into(), json!(17));
///
/// let validation = Validation::new(values).check("age", |age| age.as_u64().is_some_and(|a| a >= 18), "must be an adult");
/// assert!(!validation.is_success());
/// assert_eq!(validation.errors()["age"], vec![json!("must be an adult")]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validation {
  values: Map<String, Value>,
  errors: ErrorMap,
}

impl Validation {
  pub fn new(values: Map<String, Value>) -> Self {
    Self {
      values,
      errors: ErrorMap::new(),
    }
  }

  /// Records `message` against `field`; repeated identical messages are kept once.
  pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<Value>) {
    let message = message.into();
    let messages = self.errors.entry(field.into()).or_default();
    if !messages.contains(&message) {
      messages.push(message);
    }
  }

  pub fn error(mut self, field: impl Into<String>, message: impl Into<Value>) -> Self {
    self.add_error(field, message);
    self
  }

  /// Runs `predicate` on the value under `field` (`null` when absent) and
  /// records `message` when it does not hold.
  pub fn check(mut self, field: &str, predicate: impl FnOnce(&Value) -> bool, message: impl Into<Value>) -> Self {
    let holds = predicate(self.values.get(field).unwrap_or(&Value::Null));
    if !holds {
      self.add_error(field, message);
    }
    self
  }

  pub fn values(&self) -> &Map<String, Value> {
    &self.values
  }
}

impl ValidationOutcome for Validation {
  fn is_success(&self) -> bool {
    self.errors.is_empty()
  }

  fn errors(&self) -> ErrorMap {
    self.errors.clone()
  }

  fn to_map(&self) -> Map<String, Value> {
    self.values.clone()
  }
}
