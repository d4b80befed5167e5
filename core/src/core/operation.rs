// opus/src/core/operation.rs

//! Defines the `Operation` trait implemented by every pipeline type, and `Base`,
//! the per-call state each operation instance owns.

use crate::config::Config;
use crate::core::context::Context;
use crate::core::inputs::{Args, Dependencies, Params};
use crate::error::OpusResult;
use crate::instruction::builder::Builder;
use crate::pipeline::definition::Definition;
use crate::registry;
use crate::result::OperationResult;
use std::sync::Arc;

/// State of one live operation instance.
///
/// Params and dependencies are fixed at construction and only handed out by
/// shared reference. The finished flag only ever goes from `false` to `true`.
#[derive(Debug)]
pub struct Base {
  context: Context,
  params: Params,
  dependencies: Dependencies,
  result: OperationResult,
  finished: bool,
}

impl Base {
  pub fn new(args: Args) -> Self {
    Self {
      context: Context::new(),
      params: args.params,
      dependencies: args.dependencies,
      result: OperationResult::new(),
      finished: false,
    }
  }

  pub fn context(&self) -> &Context {
    &self.context
  }

  pub fn context_mut(&mut self) -> &mut Context {
    &mut self.context
  }

  pub fn params(&self) -> &Params {
    &self.params
  }

  pub fn dependencies(&self) -> &Dependencies {
    &self.dependencies
  }

  pub fn result(&self) -> &OperationResult {
    &self.result
  }

  pub fn result_mut(&mut self) -> &mut OperationResult {
    &mut self.result
  }

  /// Ends the call after the current instruction without marking it failed.
  pub fn finish(&mut self) {
    self.finished = true;
  }

  pub fn is_finished(&self) -> bool {
    self.finished
  }

  pub(crate) fn take_result(&mut self) -> OperationResult {
    std::mem::take(&mut self.result)
  }
}

/// A pipeline type.
///
/// Implementors hold a `Base` and declare their instructions once in
/// `declare`; the declaration is cached per type and shared by every call.
///
/// ```
/// use opus::{Args, Base, Builder, Operation};
///
/// struct Greet {
///   base: Base,
/// }
///
/// impl Operation for Greet {
///   fn new(base: Base) -> Self {
///     Self { base }
///   }
///   fn base(&self) -> &Base {
///     &self.base
///   }
///   fn base_mut(&mut self) -> &mut Base {
///     &mut self.base
///   }
///   fn declare(steps: &mut Builder<Self>) {
///     steps.step("greet", Self::greet);
///   }
/// }
///
/// impl Greet {
///   fn greet(&mut self) -> anyhow::Result<()> {
///     let name = self.params().get("name").and_then(|v| v.as_str()).unwrap_or("world").to_string();
///     self.result_mut().set_output(format!("hello {name}"));
///     Ok(())
///   }
/// }
///
/// let result = Greet::call(Args::new().param("name", "opus")).unwrap();
/// assert!(result.is_success());
/// assert_eq!(result.output(), "hello opus");
/// ```
pub trait Operation: Sized + 'static {
  /// Type name used to qualify exception keys (`Name#step`). `None` leaves
  /// keys as the bare step name.
  const NAME: Option<&'static str> = None;

  fn new(base: Base) -> Self;

  fn base(&self) -> &Base;

  fn base_mut(&mut self) -> &mut Base;

  /// Declares the instruction tree. Runs once per type, on first use.
  fn declare(steps: &mut Builder<Self>);

  /// Type-level configuration, applied on top of the global defaults.
  fn configure(_config: &mut Config) {}

  /// The cached definition of this type.
  fn definition() -> Arc<Definition<Self>> {
    registry::definition::<Self>()
  }

  /// Runs one call: a fresh instance, context and result, walked to completion
  /// or early termination.
  fn call(args: Args) -> OpusResult<OperationResult> {
    Self::definition().call(args)
  }

  fn context(&self) -> &Context {
    self.base().context()
  }

  fn context_mut(&mut self) -> &mut Context {
    self.base_mut().context_mut()
  }

  fn params(&self) -> &Params {
    self.base().params()
  }

  fn dependencies(&self) -> &Dependencies {
    self.base().dependencies()
  }

  fn result(&self) -> &OperationResult {
    self.base().result()
  }

  fn result_mut(&mut self) -> &mut OperationResult {
    self.base_mut().result_mut()
  }

  fn finish(&mut self) {
    self.base_mut().finish();
  }

  fn is_finished(&self) -> bool {
    self.base().is_finished()
  }
}
