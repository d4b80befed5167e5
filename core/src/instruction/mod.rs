// opus/src/instruction/mod.rs

//! The declared instruction tree: kinds, nodes and their bodies.
//!
//! Trees are built once per operation type by [`builder::Builder`] and never
//! mutated afterwards. The executor threads the effective kind of a leaf
//! through its recursive walk instead of rewriting nodes.

pub mod builder;

use crate::core::step::StepDef;
use serde_json::{json, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionKind {
  Step,
  Validate,
  Transaction,
  Benchmark,
  Operation,
  Operations,
  Success,
  FinishIf,
}

impl InstructionKind {
  pub fn as_str(self) -> &'static str {
    match self {
      InstructionKind::Step => "step",
      InstructionKind::Validate => "validate",
      InstructionKind::Transaction => "transaction",
      InstructionKind::Benchmark => "benchmark",
      InstructionKind::Operation => "operation",
      InstructionKind::Operations => "operations",
      InstructionKind::Success => "success",
      InstructionKind::FinishIf => "finish_if",
    }
  }
}

impl fmt::Display for InstructionKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Either a single named step or a nested sequence.
pub enum Body<O: 'static> {
  Step(StepDef<O>),
  Block(Vec<Instruction<O>>),
}

impl<O: 'static> Body<O> {
  /// The step name, or the names of every leaf step joined by `-`.
  pub fn label(&self) -> String {
    match self {
      Body::Step(step) => step.name.clone(),
      Body::Block(instructions) => {
        let mut names = Vec::new();
        for instruction in instructions {
          collect_leaf_names(instruction, &mut names);
        }
        names.join("-")
      }
    }
  }
}

fn collect_leaf_names<O: 'static>(instruction: &Instruction<O>, names: &mut Vec<String>) {
  match &instruction.body {
    Body::Step(step) => names.push(step.name.clone()),
    Body::Block(children) => {
      for child in children {
        collect_leaf_names(child, names);
      }
    }
  }
}

impl<O: 'static> Clone for Body<O> {
  fn clone(&self) -> Self {
    match self {
      Body::Step(step) => Body::Step(step.clone()),
      Body::Block(instructions) => Body::Block(instructions.clone()),
    }
  }
}

/// One declared node of an operation's instruction tree.
pub struct Instruction<O: 'static> {
  kind: InstructionKind,
  body: Body<O>,
}

impl<O: 'static> Instruction<O> {
  pub(crate) fn new(kind: InstructionKind, body: Body<O>) -> Self {
    Self { kind, body }
  }

  pub fn kind(&self) -> InstructionKind {
    self.kind
  }

  pub fn body(&self) -> &Body<O> {
    &self.body
  }

  /// A JSON rendering of the node, e.g. `{"kind": "step", "method": "load"}`
  /// or `{"kind": "success", "instructions": [...]}`.
  pub fn to_outline(&self) -> Value {
    match &self.body {
      Body::Step(step) => json!({ "kind": self.kind.as_str(), "method": step.name }),
      Body::Block(instructions) => json!({
        "kind": self.kind.as_str(),
        "instructions": instructions.iter().map(Instruction::to_outline).collect::<Vec<_>>(),
      }),
    }
  }
}

impl<O: 'static> Clone for Instruction<O> {
  fn clone(&self) -> Self {
    Self {
      kind: self.kind,
      body: self.body.clone(),
    }
  }
}

impl<O: 'static> fmt::Debug for Instruction<O> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.body {
      Body::Step(step) => f
        .debug_struct("Instruction")
        .field("kind", &self.kind)
        .field("method", &step.name)
        .finish(),
      Body::Block(instructions) => f
        .debug_struct("Instruction")
        .field("kind", &self.kind)
        .field("instructions", instructions)
        .finish(),
    }
  }
}
