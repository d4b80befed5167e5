// opus/src/backend/instrumentation.rs

//! Defines the `Instrumentation` contract and a `tracing`-backed implementation.

use serde_json::{Map, Value};
use tracing::{event, span, Level};

/// Wraps a unit of work in a named trace.
///
/// Used at two granularities: the whole operation (trace name = operation
/// name) and, when the configured level is `Step`, every step (trace name =
/// `#step`). Implementations must call `block` exactly once; a backend that
/// never calls it makes the engine skip the wrapped work.
pub trait Instrumentation: Send + Sync {
  /// `method` is the configured entry-point name (default `"instrument"`),
  /// `options` the configured instrumentation options.
  fn instrument(&self, method: &str, trace_name: &str, options: &Map<String, Value>, block: &mut dyn FnMut());
}

/// Opens an `INFO` span named after the trace for the duration of the block.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingInstrumentation;

impl Instrumentation for TracingInstrumentation {
  fn instrument(&self, method: &str, trace_name: &str, options: &Map<String, Value>, block: &mut dyn FnMut()) {
    let trace_span = span!(Level::INFO, "opus_trace", trace = trace_name, method = method);
    let _trace_span_guard = trace_span.enter();
    event!(Level::TRACE, num_options = options.len(), "Entering instrumented block.");
    block();
  }
}
