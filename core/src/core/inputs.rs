// opus/src/core/inputs.rs

//! Caller-supplied inputs of a call: immutable params and dependencies.

use anyhow::anyhow;
use serde_json::{Map, Value};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable input parameters. The operation only ever sees `&Params`.
pub type Params = Map<String, Value>;

/// Immutable, type-keyed bag of collaborators injected by the caller
/// (repositories, clients, other operations' entry points, ...).
///
/// Values are shared behind `Arc`, so cloning the bag is cheap and a
/// dependency can be handed to several calls.
#[derive(Clone, Default)]
pub struct Dependencies {
  entries: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl Dependencies {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
    self.insert(name, value);
    self
  }

  pub fn insert<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
    self.entries.insert(name.into(), Arc::new(value));
  }

  pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
    self.entries.get(name)?.downcast_ref::<T>()
  }

  /// Like `get`, but a missing or mistyped dependency is a fault, so `?` inside a
  /// step records it against that step.
  pub fn require<T: Any>(&self, name: &str) -> anyhow::Result<&T> {
    let entry = self
      .entries
      .get(name)
      .ok_or_else(|| anyhow!("missing dependency '{name}'"))?;
    entry
      .downcast_ref::<T>()
      .ok_or_else(|| anyhow!("dependency '{name}' is not a {}", std::any::type_name::<T>()))
  }

  pub fn contains(&self, name: &str) -> bool {
    self.entries.contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl std::fmt::Debug for Dependencies {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let mut names: Vec<&String> = self.entries.keys().collect();
    names.sort();
    f.debug_struct("Dependencies").field("names", &names).finish()
  }
}

/// Arguments of a single call.
#[derive(Debug, Clone, Default)]
pub struct Args {
  pub params: Params,
  pub dependencies: Dependencies,
}

impl Args {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_params(mut self, params: Params) -> Self {
    self.params = params;
    self
  }

  pub fn with_dependencies(mut self, dependencies: Dependencies) -> Self {
    self.dependencies = dependencies;
    self
  }

  pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
    self.params.insert(name.into(), value.into());
    self
  }

  pub fn dependency<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
    self.dependencies.insert(name, value);
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn dependencies_are_typed() {
    let deps = Dependencies::new().with("limit", 10_u32).with("name", "svc".to_string());
    assert_eq!(deps.get::<u32>("limit"), Some(&10));
    assert_eq!(deps.get::<i64>("limit"), None);
    assert_eq!(deps.require::<String>("name").unwrap(), "svc");

    let missing = deps.require::<u32>("other").unwrap_err();
    assert_eq!(missing.to_string(), "missing dependency 'other'");
    assert!(deps.require::<String>("limit").is_err());
  }

  #[test]
  fn args_builder_collects_params() {
    let args = Args::new().param("profile_id", 102).dependency("flag", true);
    assert_eq!(args.params["profile_id"], json!(102));
    assert!(args.dependencies.contains("flag"));
  }
}
