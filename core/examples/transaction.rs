// opus_core/examples/transaction.rs

use opus::{Args, Base, Builder, Config, FnTransaction, Operation, OpusError};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// A toy store with snapshot-based rollback.
#[derive(Default)]
struct Store {
  balance: Mutex<i64>,
}

struct Transfer {
  base: Base,
}

impl Operation for Transfer {
  fn new(base: Base) -> Self {
    Self { base }
  }

  fn base(&self) -> &Base {
    &self.base
  }

  fn base_mut(&mut self) -> &mut Base {
    &mut self.base
  }

  fn declare(steps: &mut Builder<Self>) {
    steps.transaction_block(|t| {
      t.step("withdraw", |op: &mut Self| {
        let amount = op.params().get("amount").and_then(|amount| amount.as_i64()).unwrap_or(0);
        let store = op.dependencies().require::<Arc<Store>>("store")?;
        let mut balance = store.balance.lock();
        *balance -= amount;
        if *balance < 0 {
          drop(balance);
          op.result_mut().add_error("amount", "exceeds the balance");
        }
        Ok(())
      });
      t.step("confirm", |op: &mut Self| {
        op.result_mut().set_output("transferred");
        Ok(())
      });
    });
  }
}

fn main() -> Result<(), OpusError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  let store = Arc::new(Store::default());
  *store.balance.lock() = 100;

  // Snapshot the balance before the block and restore it when the block fails.
  let backend_store = Arc::clone(&store);
  let backend = FnTransaction::new(move |method: &str, _options, block: &mut dyn FnMut() -> anyhow::Result<()>| {
    let snapshot = *backend_store.balance.lock();
    info!(%method, snapshot, "Transaction started");
    let outcome = block();
    if outcome.is_err() {
      *backend_store.balance.lock() = snapshot;
      info!("Transaction rolled back");
    }
    outcome
  });
  Transfer::definition().configure(|config: &mut Config| config.transaction_backend = Some(Arc::new(backend)))?;

  let ok = Transfer::call(Args::new().param("amount", 30).dependency("store", Arc::clone(&store)))?;
  info!("First transfer: {} / balance {}", ok.output(), *store.balance.lock());
  assert_eq!(*store.balance.lock(), 70);

  let too_much = Transfer::call(Args::new().param("amount", 500).dependency("store", Arc::clone(&store)))?;
  info!("Second transfer errors: {:?} / balance {}", too_much.errors(), *store.balance.lock());
  assert!(too_much.is_failure());
  assert_eq!(*store.balance.lock(), 70);

  Ok(())
}
