// opus/src/core/context.rs

//! Defines `Context`, the mutable map shared by every step of one call.
//!
//! A fresh context is created for each call and dropped with the operation
//! instance, so nothing written here leaks into a later call. The per-step output
//! records written by `validate`, `operation` and `operations` also land here,
//! under `<step>_output`.

use anyhow::Context as _;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context(Map<String, Value>);

impl Context {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.0.get(key)
  }

  pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
    self.0.get_mut(key)
  }

  /// Deserializes the value under `key`. A missing key is `Ok(None)`; a value of
  /// the wrong shape is an error, which fails the calling step.
  pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>> {
    self
      .0
      .get(key)
      .map(|value| {
        serde_json::from_value(value.clone())
          .with_context(|| format!("context value '{key}' is not a {}", std::any::type_name::<T>()))
      })
      .transpose()
  }

  pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
    self.0.insert(key.into(), value.into())
  }

  /// Serializes `value` and stores it under `key`.
  pub fn set<T: Serialize + ?Sized>(&mut self, key: impl Into<String>, value: &T) -> anyhow::Result<()> {
    let key = key.into();
    let value = serde_json::to_value(value).with_context(|| format!("cannot store '{key}' in the context"))?;
    self.0.insert(key, value);
    Ok(())
  }

  /// Returns the value under `key`, storing `default()` first if it is absent.
  /// Defaults are evaluated per call, so two calls never share a default.
  pub fn get_or_insert_with(&mut self, key: &str, default: impl FnOnce() -> Value) -> &mut Value {
    self.0.entry(key.to_string()).or_insert_with(default)
  }

  pub fn remove(&mut self, key: &str) -> Option<Value> {
    self.0.remove(key)
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.0.contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
    self.0.iter()
  }

  /// The output recorded for `step` by a `validate`, `operation` or
  /// `operations` instruction.
  pub fn output_of(&self, step: &str) -> Option<&Value> {
    self.0.get(&Self::output_key(step))
  }

  pub(crate) fn record_output(&mut self, step: &str, output: Value) {
    self.0.insert(Self::output_key(step), output);
  }

  fn output_key(step: &str) -> String {
    format!("{step}_output")
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn typed_access_round_trips_through_json() {
    let mut context = Context::new();
    context.set("ids", &vec![1_u32, 2, 3]).unwrap();
    assert_eq!(context.get_as::<Vec<u32>>("ids").unwrap(), Some(vec![1, 2, 3]));
    assert_eq!(context.get_as::<Vec<u32>>("missing").unwrap(), None);
    assert!(context.get_as::<String>("ids").is_err());
  }

  #[test]
  fn get_or_insert_with_only_defaults_once() {
    let mut context = Context::new();
    *context.get_or_insert_with("foo", || json!("aaa")) = json!("bbb");
    assert_eq!(context.get_or_insert_with("foo", || json!("ccc")), &json!("bbb"));
  }

  #[test]
  fn outputs_are_keyed_by_step() {
    let mut context = Context::new();
    context.record_output("operation_1", json!({"example": "output"}));
    assert_eq!(context.output_of("operation_1"), Some(&json!({"example": "output"})));
    assert!(context.contains_key("operation_1_output"));
  }
}
