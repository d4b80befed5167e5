// opus_core/examples/sub_operations.rs

use opus::{Args, Base, Builder, Operation, OpusError};
use serde_json::json;
use tracing::info;

struct PriceItem {
  base: Base,
}

impl Operation for PriceItem {
  const NAME: Option<&'static str> = Some("PriceItem");

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
    steps.step("price", |op: &mut Self| {
      let quantity = op.params().get("quantity").and_then(|q| q.as_i64()).unwrap_or(0);
      if quantity <= 0 {
        op.result_mut().add_error("quantity", "must be positive");
      } else {
        op.result_mut().set_output(quantity * 250);
      }
      Ok(())
    });
  }
}

struct PriceOrder {
  base: Base,
}

impl Operation for PriceOrder {
  const NAME: Option<&'static str> = Some("PriceOrder");

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
    steps
      .operations("items", |op: &mut Self| {
        let quantities = op.params().get("quantities").and_then(|q| q.as_array()).cloned().unwrap_or_default();
        quantities
          .into_iter()
          .map(|quantity| PriceItem::call(Args::new().param("quantity", quantity)).map_err(anyhow::Error::from))
          .collect::<anyhow::Result<Vec<_>>>()
      })
      .operation("shipping", |_: &mut Self| {
        PriceItem::call(Args::new().param("quantity", 1)).map_err(anyhow::Error::from)
      })
      .step("total", |op: &mut Self| {
        let items: Vec<i64> = op.context().get_as("items_output")?.unwrap_or_default();
        let shipping: i64 = op.context().get_as("shipping_output")?.unwrap_or_default();
        op.result_mut().set_output(items.iter().sum::<i64>() + shipping);
        Ok(())
      });
  }
}

fn main() -> Result<(), OpusError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  let order = PriceOrder::call(Args::new().param("quantities", json!([1, 2])))?;
  info!("Total: {}", order.output());
  info!("Trace: {}", serde_json::to_string(order.executions()).unwrap_or_default());
  assert_eq!(order.output(), &json!(1000));

  let broken = PriceOrder::call(Args::new().param("quantities", json!([1, 0])))?;
  info!("Errors: {:?}", broken.errors());
  assert!(broken.is_failure());

  Ok(())
}
