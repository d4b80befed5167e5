// opus/src/backend/reporter.rs

//! Defines the `Reporter` sink for faults caught at step boundaries.

use tracing::{event, Level};

/// Receives every runtime fault the executor catches.
///
/// Reporting is best-effort: the executor isolates the call, so a panicking
/// reporter is logged and otherwise ignored.
pub trait Reporter: Send + Sync {
  fn error(&self, error: &anyhow::Error);
}

/// Emits each fault as an `ERROR` event, with the full cause chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
  fn error(&self, error: &anyhow::Error) {
    event!(Level::ERROR, error = %format!("{error:#}"), "Operation step fault reported.");
  }
}
