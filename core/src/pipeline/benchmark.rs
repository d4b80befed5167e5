// opus/src/pipeline/benchmark.rs

//! The `benchmark` strategy: times the wrapped work and records the timings
//! in the result's information under the body's label.

use crate::core::operation::Operation;
use crate::error::OpusResult;
use crate::instruction::Body;
use crate::pipeline::execution::{Executor, Scope};
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{event, Level};

impl<O: Operation> Executor<'_, O> {
  pub(super) fn run_benchmark(&mut self, body: &Body<O>) -> OpusResult<()> {
    let label = body.label();
    let cpu_started = process_cpu_seconds();
    let started = Instant::now();

    self.evaluate_body(body, Scope::ROOT)?;

    let real = started.elapsed().as_secs_f64();
    let total = match (cpu_started, process_cpu_seconds()) {
      (Some(before), Some(after)) => json!(after - before),
      _ => Value::Null,
    };

    event!(Level::DEBUG, label = label.as_str(), real, "Benchmark recorded.");
    self
      .operation
      .result_mut()
      .add_information([(label, json!({ "real": real, "total": total }))]);
    Ok(())
  }
}

/// User plus system CPU time consumed by this process so far.
#[cfg(unix)]
fn process_cpu_seconds() -> Option<f64> {
  let mut usage = std::mem::MaybeUninit::<libc::rusage>::zeroed();
  // SAFETY: getrusage only writes into the struct we hand it.
  let status = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
  if status != 0 {
    return None;
  }
  // SAFETY: a zero status means the struct was filled in.
  let usage = unsafe { usage.assume_init() };
  let seconds = |time: libc::timeval| time.tv_sec as f64 + time.tv_usec as f64 / 1_000_000.0;
  Some(seconds(usage.ru_utime) + seconds(usage.ru_stime))
}

#[cfg(not(unix))]
fn process_cpu_seconds() -> Option<f64> {
  None
}
