// opus/src/pipeline/transaction.rs

//! The `transaction` strategy.
//!
//! The nested walk runs inside the configured backend's block. When the result
//! is a failure afterwards, the block returns a private sentinel so the backend
//! rolls back; the sentinel is swallowed once the backend returns. An explicit
//! finish with a successful result commits.

use crate::core::operation::Operation;
use crate::error::{OpusError, OpusResult};
use crate::instruction::Body;
use crate::pipeline::execution::{Executor, Scope};
use thiserror::Error;
use tracing::{event, instrument, Level};

#[derive(Debug, Error)]
#[error("transaction rolled back")]
struct RollbackSignal;

/// Pseudo-step name for faults raised by the backend itself.
const TRANSACTION_STEP: &str = "transaction";

impl<O: Operation> Executor<'_, O> {
  #[instrument(name = "Executor::run_transaction", skip_all, fields(label = %body.label()), err(Display))]
  pub(super) fn run_transaction(&mut self, body: &Body<O>) -> OpusResult<()> {
    let config = self.config;
    let backend = config.transaction_backend.as_ref().ok_or_else(|| {
      event!(Level::ERROR, "Transaction declared without a configured backend.");
      OpusError::TransactionBackendMissing {
        operation: self.operation_name(),
      }
    })?;

    let mut block = || -> anyhow::Result<()> {
      self.evaluate_body(body, Scope::ROOT).map_err(anyhow::Error::new)?;
      if self.operation.result().is_failure() {
        return Err(RollbackSignal.into());
      }
      Ok(())
    };

    match backend.transaction(&config.transaction_method, config.transaction_options.as_ref(), &mut block) {
      Ok(()) => {
        event!(Level::DEBUG, "Transaction committed.");
        Ok(())
      }
      Err(err) if err.is::<RollbackSignal>() => {
        event!(Level::INFO, "Transaction rolled back after a failure.");
        Ok(())
      }
      Err(err) => match err.downcast::<OpusError>() {
        Ok(opus_error) if opus_error.is_authoring_error() => Err(opus_error),
        Ok(opus_error) => {
          self.record_fault(TRANSACTION_STEP, &anyhow::Error::new(opus_error));
          Ok(())
        }
        Err(fault) => {
          self.record_fault(TRANSACTION_STEP, &fault);
          Ok(())
        }
      },
    }
  }
}
