// opus/src/error.rs
use thiserror::Error;

/// Framework-level errors.
///
/// Runtime faults raised by step handlers never show up here: they are caught at
/// the step boundary and recorded into the `OperationResult`. An `OpusError`
/// means the operation was authored or configured incorrectly, so it escapes
/// `call` instead of being folded into the result.
#[derive(Debug, Error)]
pub enum OpusError {
  #[error("Step '{step}' is declared with `validate` but returned {found}; expected an OperationResult or a validation outcome")]
  UnrecognizedValidationOutcome { step: String, found: &'static str },

  #[error("Step '{step}' is declared with `operation` but returned {found}; expected an OperationResult")]
  WrongOperationResult { step: String, found: &'static str },

  #[error("Step '{step}' is declared with `operations` but returned {found}; have to return a Vec of OperationResult")]
  WrongOperationsResult { step: String, found: &'static str },

  #[error("Definition of '{operation}' is frozen: instructions cannot be declared after the first call")]
  DefinitionFrozen { operation: String },

  #[error("Operation '{operation}' declares a transaction but no transaction backend is configured")]
  TransactionBackendMissing { operation: String },

  #[error("Invalid configuration for '{option}': {message}")]
  InvalidConfig { option: &'static str, message: String },

  #[error("Cannot retrieve output from a Failure.")]
  OutputOnFailure,
}

impl OpusError {
  /// Whether this error describes a wrongly authored or configured operation.
  /// Such errors escape `call` even when they reach a parent through one of
  /// its steps; `OutputOnFailure` is an ordinary fault of the caller.
  pub fn is_authoring_error(&self) -> bool {
    !matches!(self, OpusError::OutputOnFailure)
  }
}

pub type OpusResult<T, E = OpusError> = std::result::Result<T, E>;
