// opus/src/instruction/builder.rs

//! The declaration surface handed to `Operation::declare`.
//!
//! Each kind comes as a pair: `kind(name, handler)` declares a single named
//! step, `kind_block(|b| ...)` a nested sequence declared with the same
//! methods. Nodes are appended in call order.

use crate::core::step::{StepDef, StepValue};
use crate::instruction::{Body, Instruction, InstructionKind};

pub struct Builder<O: 'static> {
  instructions: Vec<Instruction<O>>,
}

impl<O: 'static> Default for Builder<O> {
  fn default() -> Self {
    Self::new()
  }
}

impl<O: 'static> Builder<O> {
  pub fn new() -> Self {
    Self {
      instructions: Vec::new(),
    }
  }

  fn push_step<F, R>(&mut self, kind: InstructionKind, name: impl Into<String>, handler: F) -> &mut Self
  where
    F: Fn(&mut O) -> anyhow::Result<R> + Send + Sync + 'static,
    R: Into<StepValue>,
  {
    let step = StepDef::new(name, handler);
    self.instructions.push(Instruction::new(kind, Body::Step(step)));
    self
  }

  fn push_block(&mut self, kind: InstructionKind, declare: impl FnOnce(&mut Builder<O>)) -> &mut Self {
    let mut nested = Builder::new();
    declare(&mut nested);
    self
      .instructions
      .push(Instruction::new(kind, Body::Block(nested.into_instructions())));
    self
  }

  /// A plain step; its return value is ignored.
  pub fn step<F, R>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
  where
    F: Fn(&mut O) -> anyhow::Result<R> + Send + Sync + 'static,
    R: Into<StepValue>,
  {
    self.push_step(InstructionKind::Step, name, handler)
  }

  /// A transparent group of instructions.
  pub fn step_block(&mut self, declare: impl FnOnce(&mut Builder<O>)) -> &mut Self {
    self.push_block(InstructionKind::Step, declare)
  }

  /// A step returning an `OperationResult` or a validation outcome.
  pub fn validate<F, R>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
  where
    F: Fn(&mut O) -> anyhow::Result<R> + Send + Sync + 'static,
    R: Into<StepValue>,
  {
    self.push_step(InstructionKind::Validate, name, handler)
  }

  /// Every plain step in the block is a validation; all of them run even
  /// when earlier ones fail.
  pub fn validate_block(&mut self, declare: impl FnOnce(&mut Builder<O>)) -> &mut Self {
    self.push_block(InstructionKind::Validate, declare)
  }

  pub fn transaction<F, R>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
  where
    F: Fn(&mut O) -> anyhow::Result<R> + Send + Sync + 'static,
    R: Into<StepValue>,
  {
    self.push_step(InstructionKind::Transaction, name, handler)
  }

  /// Runs the block inside the configured transaction backend, rolling back
  /// when the result is a failure afterwards.
  pub fn transaction_block(&mut self, declare: impl FnOnce(&mut Builder<O>)) -> &mut Self {
    self.push_block(InstructionKind::Transaction, declare)
  }

  pub fn benchmark<F, R>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
  where
    F: Fn(&mut O) -> anyhow::Result<R> + Send + Sync + 'static,
    R: Into<StepValue>,
  {
    self.push_step(InstructionKind::Benchmark, name, handler)
  }

  pub fn benchmark_block(&mut self, declare: impl FnOnce(&mut Builder<O>)) -> &mut Self {
    self.push_block(InstructionKind::Benchmark, declare)
  }

  /// A step returning another operation's `OperationResult`.
  pub fn operation<F, R>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
  where
    F: Fn(&mut O) -> anyhow::Result<R> + Send + Sync + 'static,
    R: Into<StepValue>,
  {
    self.push_step(InstructionKind::Operation, name, handler)
  }

  pub fn operation_block(&mut self, declare: impl FnOnce(&mut Builder<O>)) -> &mut Self {
    self.push_block(InstructionKind::Operation, declare)
  }

  /// A step returning a `Vec<OperationResult>`.
  pub fn operations<F, R>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
  where
    F: Fn(&mut O) -> anyhow::Result<R> + Send + Sync + 'static,
    R: Into<StepValue>,
  {
    self.push_step(InstructionKind::Operations, name, handler)
  }

  pub fn operations_block(&mut self, declare: impl FnOnce(&mut Builder<O>)) -> &mut Self {
    self.push_block(InstructionKind::Operations, declare)
  }

  pub fn success<F, R>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
  where
    F: Fn(&mut O) -> anyhow::Result<R> + Send + Sync + 'static,
    R: Into<StepValue>,
  {
    self.push_step(InstructionKind::Success, name, handler)
  }

  /// Every instruction in the block runs unless the operation finishes;
  /// failures inside the group do not stop its siblings.
  pub fn success_block(&mut self, declare: impl FnOnce(&mut Builder<O>)) -> &mut Self {
    self.push_block(InstructionKind::Success, declare)
  }

  /// A predicate step; a truthy return finishes the operation.
  pub fn finish_if<F, R>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
  where
    F: Fn(&mut O) -> anyhow::Result<R> + Send + Sync + 'static,
    R: Into<StepValue>,
  {
    self.push_step(InstructionKind::FinishIf, name, handler)
  }

  pub fn finish_if_block(&mut self, declare: impl FnOnce(&mut Builder<O>)) -> &mut Self {
    self.push_block(InstructionKind::FinishIf, declare)
  }

  pub fn len(&self) -> usize {
    self.instructions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.instructions.is_empty()
  }

  pub fn into_instructions(self) -> Vec<Instruction<O>> {
    self.instructions
  }
}
