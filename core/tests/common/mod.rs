// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use opus::{Instrumentation, Reporter, TransactionBackend};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::Level;

/// Implements the `Base` plumbing of `Operation` for a struct with a `base` field.
macro_rules! operation_base {
  () => {
    fn new(base: opus::Base) -> Self {
      Self { base }
    }

    fn base(&self) -> &opus::Base {
      &self.base
    }

    fn base_mut(&mut self) -> &mut opus::Base {
      &mut self.base
    }
  };
}

// --- Recording collaborators ---

/// Transaction backend that logs begin/commit/rollback and the options it saw.
#[derive(Default)]
pub struct RecordingTransaction {
  pub log: Mutex<Vec<String>>,
  pub options: Mutex<Vec<Option<Value>>>,
}

impl RecordingTransaction {
  pub fn log(&self) -> Vec<String> {
    self.log.lock().clone()
  }
}

impl TransactionBackend for RecordingTransaction {
  fn transaction(
    &self,
    method: &str,
    options: Option<&Value>,
    block: &mut dyn FnMut() -> anyhow::Result<()>,
  ) -> anyhow::Result<()> {
    self.log.lock().push(format!("{method}:begin"));
    self.options.lock().push(options.cloned());
    match block() {
      Ok(()) => {
        self.log.lock().push("commit".to_string());
        Ok(())
      }
      Err(err) => {
        self.log.lock().push("rollback".to_string());
        Err(err)
      }
    }
  }
}

/// Transaction backend that fails before running the block.
pub struct BrokenTransaction;

impl TransactionBackend for BrokenTransaction {
  fn transaction(
    &self,
    _method: &str,
    _options: Option<&Value>,
    _block: &mut dyn FnMut() -> anyhow::Result<()>,
  ) -> anyhow::Result<()> {
    Err(anyhow::anyhow!("connection lost"))
  }
}

#[derive(Default)]
pub struct RecordingReporter {
  pub errors: Mutex<Vec<String>>,
}

impl RecordingReporter {
  pub fn errors(&self) -> Vec<String> {
    self.errors.lock().clone()
  }
}

impl Reporter for RecordingReporter {
  fn error(&self, error: &anyhow::Error) {
    self.errors.lock().push(error.to_string());
  }
}

pub struct PanickingReporter;

impl Reporter for PanickingReporter {
  fn error(&self, _error: &anyhow::Error) {
    panic!("reporter exploded");
  }
}

#[derive(Default)]
pub struct RecordingInstrumentation {
  pub traces: Mutex<Vec<String>>,
}

impl RecordingInstrumentation {
  pub fn traces(&self) -> Vec<String> {
    self.traces.lock().clone()
  }
}

impl Instrumentation for RecordingInstrumentation {
  fn instrument(&self, method: &str, trace_name: &str, _options: &Map<String, Value>, block: &mut dyn FnMut()) {
    self.traces.lock().push(format!("{method}:{trace_name}"));
    block();
  }
}

/// Never yields to the wrapped block.
pub struct SkippingInstrumentation;

impl Instrumentation for SkippingInstrumentation {
  fn instrument(&self, _method: &str, _trace_name: &str, _options: &Map<String, Value>, _block: &mut dyn FnMut()) {}
}

/// Flattens an execution trace of plain steps into their names.
pub fn step_names(result: &opus::OperationResult) -> Vec<String> {
  result.executions().iter().map(|execution| execution.name().to_string()).collect()
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
