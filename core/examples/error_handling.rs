// opus_core/examples/error_handling.rs

use anyhow::Context as _;
use opus::{Args, Base, Builder, Config, Operation, OpusError, TracingReporter};
use std::sync::Arc;
use tracing::{error, info};

struct ImportRows {
  base: Base,
}

impl Operation for ImportRows {
  const NAME: Option<&'static str> = Some("ImportRows");

  fn new(base: Base) -> Self {
    Self { base }
  }

  fn base(&self) -> &Base {
    &self.base
  }

  fn base_mut(&mut self) -> &mut Base {
    &mut self.base
  }

  // Every caught fault is also sent to the reporter.
  fn configure(config: &mut Config) {
    config.reporter = Some(Arc::new(TracingReporter));
  }

  fn declare(steps: &mut Builder<Self>) {
    steps
      .step("parse_rows", |op: &mut Self| {
        let raw = op.params().get("rows").and_then(|rows| rows.as_str()).unwrap_or_default();
        let rows = raw
          .split(',')
          .map(|row| row.trim().parse::<i64>().with_context(|| format!("row '{row}' is not a number")))
          .collect::<anyhow::Result<Vec<_>>>()?;
        op.context_mut().set("rows", &rows)?;
        Ok(())
      })
      .step("check_rows", |op: &mut Self| {
        let rows: Vec<i64> = op.context().get_as("rows")?.unwrap_or_default();
        if rows.iter().any(|row| *row < 0) {
          op.result_mut().add_error("rows", "must not be negative");
        }
        Ok(())
      })
      .step("total", |op: &mut Self| {
        let rows: Vec<i64> = op.context().get_as("rows")?.unwrap_or_default();
        op.result_mut().set_output(rows.iter().sum::<i64>());
        Ok(())
      });
  }
}

// Declared with `operations` but returns a single result: an authoring error.
struct Misdeclared {
  base: Base,
}

impl Operation for Misdeclared {
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
    steps.operations("children", |_: &mut Self| ImportRows::call(Args::new().param("rows", "1")).map_err(anyhow::Error::from));
  }
}

fn main() -> Result<(), OpusError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Runtime fault: recorded in the result ---");
  let faulty = ImportRows::call(Args::new().param("rows", "1, two, 3"))?;
  info!("Exceptions: {:?}", faulty.exceptions());
  assert!(faulty.exceptions().contains_key("ImportRows#parse_rows"));

  info!("--- Domain failure: recorded as an error ---");
  let negative = ImportRows::call(Args::new().param("rows", "1, -2"))?;
  info!("Errors: {:?}", negative.errors());
  assert!(negative.is_failure());

  info!("--- Success ---");
  let ok = ImportRows::call(Args::new().param("rows", "1, 2, 3"))?;
  assert_eq!(ok.output(), &serde_json::json!(6));

  info!("--- Contract violation: raised from call ---");
  match Misdeclared::call(Args::new()) {
    Ok(result) => error!("Unexpected result: {:?}", result),
    Err(e) => {
      info!("Call failed as expected: {}", e);
      assert!(matches!(e, OpusError::WrongOperationsResult { .. }));
    }
  }

  Ok(())
}
