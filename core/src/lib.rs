// src/lib.rs

//! Opus: a declarative operation-pipeline engine for Rust.
//!
//! An operation is a type that declares, once, an ordered tree of
//! instructions over its own methods:
//!  - Plain steps mutating a per-call context or the result's output.
//!  - Validations whose failures are collected in a single pass.
//!  - Transactional blocks that roll back when the result is a failure.
//!  - Benchmarks recording wall-clock and CPU timings.
//!  - Sub-operations (one or many) whose results merge into the caller's.
//!  - Success groups and `finish_if` predicates for early, successful exits.
//!
//! Each call builds a fresh instance, walks the tree depth-first and returns
//! an `OperationResult` holding errors, exceptions, information, the
//! execution trace and the output.

pub mod backend;
pub mod config;
pub mod core;
pub mod error;
pub mod instruction;
pub mod pipeline;
pub mod registry;
pub mod result;

// --- Re-exports for the Public API ---

pub use crate::core::context::Context;
pub use crate::core::control::BreakPolicy;
pub use crate::core::inputs::{Args, Dependencies, Params};
pub use crate::core::operation::{Base, Operation};
pub use crate::core::step::{StepDef, StepValue};

pub use crate::instruction::builder::Builder;
pub use crate::instruction::{Body, Instruction, InstructionKind};

pub use crate::pipeline::definition::Definition;

pub use crate::result::{ErrorMap, ExceptionMap, Execution, OperationResult};

pub use crate::config::{Config, InstrumentationLevel, Mode};

pub use crate::backend::{
  FnTransaction, Instrumentation, PassthroughTransaction, Reporter, TracingInstrumentation, TracingReporter,
  TransactionBackend, Validation, ValidationOutcome,
};

pub use crate::error::{OpusError, OpusResult};

/*
    Core Workflow:
    1. Define a struct holding a `Base` and implement `Operation` for it.
    2. In `declare`, list the instructions: `steps.validate(...)`,
       `steps.transaction_block(|t| { t.step(...); })`, `steps.operation(...)`.
    3. Optionally override `configure` (or call `Config::configure_global`) to
       wire a transaction backend, instrumentation and a reporter.
    4. Call `MyOperation::call(Args::new().param(...).dependency(...))` and
       inspect the returned `OperationResult`.
*/
