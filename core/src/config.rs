// opus/src/config.rs

//! Per-operation-type configuration and the process-wide defaults every type
//! inherits from.

use crate::backend::instrumentation::Instrumentation;
use crate::backend::reporter::Reporter;
use crate::backend::transaction::TransactionBackend;
use crate::error::{OpusError, OpusResult};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{event, Level};

static GLOBAL: Lazy<RwLock<Config>> = Lazy::new(|| RwLock::new(Config::default()));

/// Controls whether the execution trace is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
  #[default]
  Development,
  /// Terse: no execution trace.
  Production,
}

impl FromStr for Mode {
  type Err = OpusError;

  fn from_str(value: &str) -> OpusResult<Self> {
    match value {
      "development" => Ok(Mode::Development),
      "production" => Ok(Mode::Production),
      other => Err(OpusError::InvalidConfig {
        option: "mode",
        message: format!("unknown mode '{other}', expected 'development' or 'production'"),
      }),
    }
  }
}

/// Granularity of instrumentation traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstrumentationLevel {
  /// One trace around the whole call.
  #[default]
  Operation,
  /// The operation trace plus one trace per step.
  Step,
}

impl FromStr for InstrumentationLevel {
  type Err = OpusError;

  fn from_str(value: &str) -> OpusResult<Self> {
    match value {
      "operation" => Ok(InstrumentationLevel::Operation),
      "step" => Ok(InstrumentationLevel::Step),
      other => Err(OpusError::InvalidConfig {
        option: "instrumentation_level",
        message: format!("unknown level '{other}', expected 'operation' or 'step'"),
      }),
    }
  }
}

/// Collaborators and switches for one operation type.
#[derive(Clone)]
pub struct Config {
  pub transaction_backend: Option<Arc<dyn TransactionBackend>>,
  pub transaction_method: String,
  pub transaction_options: Option<Value>,
  pub instrumentation_backend: Option<Arc<dyn Instrumentation>>,
  pub instrumentation_method: String,
  pub instrumentation_options: Map<String, Value>,
  pub instrumentation_level: InstrumentationLevel,
  pub mode: Mode,
  pub reporter: Option<Arc<dyn Reporter>>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      transaction_backend: None,
      transaction_method: "transaction".to_string(),
      transaction_options: None,
      instrumentation_backend: None,
      instrumentation_method: "instrument".to_string(),
      instrumentation_options: Map::new(),
      instrumentation_level: InstrumentationLevel::default(),
      mode: Mode::default(),
      reporter: None,
    }
  }
}

impl Config {
  /// Read access to the process-wide defaults.
  pub fn global() -> parking_lot::RwLockReadGuard<'static, Config> {
    GLOBAL.read()
  }

  /// Edits the process-wide defaults. The edit is discarded if the result
  /// does not validate.
  ///
  /// Only types whose configuration has not been materialized yet see the
  /// change; an operation type copies the defaults on first use.
  pub fn configure_global(edit: impl FnOnce(&mut Config)) -> OpusResult<()> {
    let mut candidate = GLOBAL.read().clone();
    edit(&mut candidate);
    candidate.validate()?;
    *GLOBAL.write() = candidate;
    event!(Level::DEBUG, "Global opus configuration updated.");
    Ok(())
  }

  pub fn reset_global() {
    *GLOBAL.write() = Config::default();
  }

  /// A copy of the current process-wide defaults.
  pub fn inherited() -> Config {
    GLOBAL.read().clone()
  }

  pub fn validate(&self) -> OpusResult<()> {
    if self.transaction_method.trim().is_empty() {
      return Err(OpusError::InvalidConfig {
        option: "transaction_method",
        message: "method name must not be empty".to_string(),
      });
    }
    if self.instrumentation_method.trim().is_empty() {
      return Err(OpusError::InvalidConfig {
        option: "instrumentation_method",
        message: "method name must not be empty".to_string(),
      });
    }
    Ok(())
  }

  pub fn traces_executions(&self) -> bool {
    self.mode == Mode::Development
  }

  pub fn instrumentation_enabled(&self) -> bool {
    self.instrumentation_backend.is_some()
  }

  /// Runs `work` inside the configured instrumentation at `level`.
  ///
  /// Without a backend, or for a step-level trace when only operation-level
  /// tracing is configured, `work` runs directly. Returns `None` only when a
  /// backend never ran the block.
  pub(crate) fn instrument<T>(&self, trace_name: &str, level: InstrumentationLevel, work: impl FnOnce() -> T) -> Option<T> {
    let backend = match &self.instrumentation_backend {
      Some(backend) if level == InstrumentationLevel::Operation || self.instrumentation_level == level => backend,
      _ => return Some(work()),
    };

    let mut work = Some(work);
    let mut output = None;
    backend.instrument(
      &self.instrumentation_method,
      trace_name,
      &self.instrumentation_options,
      &mut || {
        if let Some(work) = work.take() {
          output = Some(work());
        }
      },
    );

    if output.is_none() {
      event!(Level::WARN, trace = trace_name, "Instrumentation backend did not run the wrapped block.");
    }
    output
  }
}

// Backends are trait objects; print whether each is set.
impl std::fmt::Debug for Config {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Config")
      .field("transaction_backend", &self.transaction_backend.is_some())
      .field("transaction_method", &self.transaction_method)
      .field("transaction_options", &self.transaction_options)
      .field("instrumentation_backend", &self.instrumentation_backend.is_some())
      .field("instrumentation_method", &self.instrumentation_method)
      .field("instrumentation_options", &self.instrumentation_options)
      .field("instrumentation_level", &self.instrumentation_level)
      .field("mode", &self.mode)
      .field("reporter", &self.reporter.is_some())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults() {
    let config = Config::default();
    assert_eq!(config.transaction_method, "transaction");
    assert_eq!(config.instrumentation_method, "instrument");
    assert_eq!(config.instrumentation_level, InstrumentationLevel::Operation);
    assert!(config.traces_executions());
    assert!(!config.instrumentation_enabled());
    assert!(config.validate().is_ok());
  }

  #[test]
  fn parses_mode_and_level() {
    assert_eq!("production".parse::<Mode>().unwrap(), Mode::Production);
    assert_eq!("step".parse::<InstrumentationLevel>().unwrap(), InstrumentationLevel::Step);
    let err = "verbose".parse::<Mode>().unwrap_err();
    assert!(matches!(err, OpusError::InvalidConfig { option: "mode", .. }));
  }

  #[test]
  fn rejects_empty_method_names() {
    let config = Config {
      transaction_method: " ".to_string(),
      ..Config::default()
    };
    assert!(matches!(
      config.validate(),
      Err(OpusError::InvalidConfig {
        option: "transaction_method",
        ..
      })
    ));
  }

  #[test]
  fn instrument_without_backend_runs_directly() {
    let config = Config::default();
    assert_eq!(config.instrument("#step", InstrumentationLevel::Step, || 7), Some(7));
  }
}
