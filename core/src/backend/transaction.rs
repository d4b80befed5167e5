// opus/src/backend/transaction.rs

//! Defines the `TransactionBackend` contract and its implementations.

use serde_json::Value;
use tracing::{event, Level};

/// A scoped-resource backend wrapping the instructions of a `transaction`.
///
/// The backend must run `block` exactly once and then:
/// - commit when `block` returns `Ok(())`,
/// - roll back and return the block's error unchanged when it returns `Err`.
///
/// The engine signals "roll back" by returning a private sentinel error from
/// `block` and suppresses that sentinel once `transaction` returns, so a backend
/// never needs to know why the block failed. Any other error coming back from
/// the backend is treated as a runtime fault of the transaction itself.
pub trait TransactionBackend: Send + Sync {
  /// `method` is the configured entry-point name (default `"transaction"`),
  /// `options` the configured extra arguments, if any.
  fn transaction(
    &self,
    method: &str,
    options: Option<&Value>,
    block: &mut dyn FnMut() -> anyhow::Result<()>,
  ) -> anyhow::Result<()>;
}

/// Runs the block with no durability of its own. Suitable for tests and for
/// operations whose side effects need no atomicity.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTransaction;

impl TransactionBackend for PassthroughTransaction {
  fn transaction(
    &self,
    method: &str,
    _options: Option<&Value>,
    block: &mut dyn FnMut() -> anyhow::Result<()>,
  ) -> anyhow::Result<()> {
    event!(Level::TRACE, %method, "Passthrough transaction entered.");
    block()
  }
}

/// Adapts a closure into a backend, so a database handle's own transaction
/// API can be wired in without a dedicated type.
pub struct FnTransaction<F> {
  run: F,
}

impl<F> FnTransaction<F>
where
  F: Fn(&str, Option<&Value>, &mut dyn FnMut() -> anyhow::Result<()>) -> anyhow::Result<()> + Send + Sync,
{
  pub fn new(run: F) -> Self {
    Self { run }
  }
}

impl<F> TransactionBackend for FnTransaction<F>
where
  F: Fn(&str, Option<&Value>, &mut dyn FnMut() -> anyhow::Result<()>) -> anyhow::Result<()> + Send + Sync,
{
  fn transaction(
    &self,
    method: &str,
    options: Option<&Value>,
    block: &mut dyn FnMut() -> anyhow::Result<()>,
  ) -> anyhow::Result<()> {
    (self.run)(method, options, block)
  }
}
