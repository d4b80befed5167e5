// tests/sub_operation_tests.rs
#[macro_use]
mod common;

use common::*;
use opus::{Args, Base, Builder, Config, Execution, Mode, Operation, OpusError};
use serde_json::json;

// --- Callee ---

struct Lookup {
  base: Base,
}

impl Operation for Lookup {
  const NAME: Option<&'static str> = Some("Lookup");

  operation_base!();

  fn declare(steps: &mut Builder<Self>) {
    steps
      .step("step_44", |op: &mut Self| {
        op.result_mut().add_information([("lookup_hits".to_string(), json!(1))]);
        Ok(())
      })
      .step("step_45", |op: &mut Self| -> anyhow::Result<()> {
        let id = op.params().get("id").cloned().unwrap_or_default();
        match id.as_i64() {
          Some(id) if id < 0 => {
            op.result_mut().add_error("id", "must be positive");
          }
          Some(id) if id == 0 => anyhow::bail!("lookup table unavailable"),
          Some(id) => op.result_mut().set_output(json!({"id": id})),
          None => op.result_mut().add_error("id", "is missing"),
        }
        Ok(())
      });
  }
}

// --- Single sub-operation ---

struct Caller {
  base: Base,
}

impl Operation for Caller {
  operation_base!();

  fn declare(steps: &mut Builder<Self>) {
    steps
      .operation("operation_1", |op: &mut Self| {
        let id = op.params().get("id").cloned().unwrap_or_default();
        Lookup::call(Args::new().param("id", id)).map_err(anyhow::Error::from)
      })
      .step("step_2", |op: &mut Self| {
        let found = op.context().output_of("operation_1").cloned().unwrap_or_default();
        op.result_mut().set_output(found);
        Ok(())
      });
  }
}

#[test]
fn successful_sub_operation_nests_trace_and_records_output() {
  setup_tracing();
  let result = Caller::call(Args::new().param("id", 7)).unwrap();

  assert!(result.is_success());
  assert_eq!(result.output(), &json!({"id": 7}));
  assert_eq!(result.information()["lookup_hits"], json!(1));
  assert_eq!(
    result.executions(),
    &[
      Execution::Operation {
        step: "operation_1".to_string(),
        executions: vec![Execution::step("step_44"), Execution::step("step_45")],
      },
      Execution::step("step_2"),
    ]
  );
  assert_eq!(
    serde_json::to_value(result.executions()).unwrap(),
    json!([{"operation_1": ["step_44", "step_45"]}, "step_2"])
  );
}

#[test]
fn failed_sub_operation_merges_errors_and_keeps_flat_trace() {
  setup_tracing();
  let result = Caller::call(Args::new().param("id", -1)).unwrap();

  assert!(result.is_failure());
  assert_eq!(result.errors()["id"], vec![json!("must be positive")]);
  assert_eq!(result.information()["lookup_hits"], json!(1));
  assert_eq!(result.executions(), &[Execution::step("operation_1")]);
  assert_eq!(result.output(), &serde_json::Value::Null);
}

#[test]
fn failed_sub_operation_merges_exceptions() {
  setup_tracing();
  let result = Caller::call(Args::new().param("id", 0)).unwrap();

  assert!(result.is_failure());
  assert_eq!(
    result.exceptions()["Lookup#step_45"],
    vec!["lookup table unavailable".to_string()]
  );
}

// --- Collections of sub-operations ---

struct BatchCaller {
  base: Base,
}

impl Operation for BatchCaller {
  operation_base!();

  fn declare(steps: &mut Builder<Self>) {
    steps
      .operations("lookups", |op: &mut Self| {
        let ids = op.params().get("ids").and_then(|ids| ids.as_array()).cloned().unwrap_or_default();
        ids
          .into_iter()
          .map(|id| Lookup::call(Args::new().param("id", id)).map_err(anyhow::Error::from))
          .collect::<anyhow::Result<Vec<_>>>()
      })
      .step("collect", |op: &mut Self| {
        let found = op.context().output_of("lookups").cloned().unwrap_or_default();
        op.result_mut().set_output(found);
        Ok(())
      });
  }
}

#[test]
fn all_successful_sub_operations_record_outputs_and_traces() {
  setup_tracing();
  let result = BatchCaller::call(Args::new().param("ids", json!([1, 2]))).unwrap();

  assert!(result.is_success());
  assert_eq!(result.output(), &json!([{"id": 1}, {"id": 2}]));
  assert_eq!(
    serde_json::to_value(result.executions()).unwrap(),
    json!([
      {"lookups": [["step_44", "step_45"], ["step_44", "step_45"]]},
      "collect",
    ])
  );
}

#[test]
fn one_failing_sub_operation_blocks_output() {
  setup_tracing();
  let result = BatchCaller::call(Args::new().param("ids", json!([1, -5, 3]))).unwrap();

  assert!(result.is_failure());
  assert_eq!(result.errors()["id"], vec![json!("must be positive")]);
  assert_eq!(result.executions(), &[Execution::step("lookups")]);
  assert_eq!(result.output(), &serde_json::Value::Null);
}

#[test]
fn empty_collection_records_empty_output() {
  setup_tracing();
  let result = BatchCaller::call(Args::new()).unwrap();

  assert!(result.is_success());
  assert_eq!(result.output(), &json!([]));
}

// --- Trace nesting with a terse callee ---

struct QuietLookup {
  base: Base,
}

impl Operation for QuietLookup {
  operation_base!();

  fn configure(config: &mut Config) {
    config.mode = Mode::Production;
  }

  fn declare(steps: &mut Builder<Self>) {
    steps.step("lookup", |op: &mut Self| {
      op.result_mut().set_output("quiet");
      Ok(())
    });
  }
}

struct QuietCaller {
  base: Base,
}

impl Operation for QuietCaller {
  operation_base!();

  fn declare(steps: &mut Builder<Self>) {
    steps.operation("quiet", |_: &mut Self| QuietLookup::call(Args::new()).map_err(anyhow::Error::from));
  }
}

#[test]
fn production_callee_contributes_an_empty_trace() {
  setup_tracing();
  let result = QuietCaller::call(Args::new()).unwrap();

  assert_eq!(
    result.executions(),
    &[Execution::Operation {
      step: "quiet".to_string(),
      executions: vec![],
    }]
  );
  assert_eq!(result.output(), &serde_json::Value::Null);
}

// --- Authoring errors in a callee ---

struct MisdeclaredChild {
  base: Base,
}

impl Operation for MisdeclaredChild {
  operation_base!();

  fn declare(steps: &mut Builder<Self>) {
    steps.validate("check", |_: &mut Self| Ok(json!(1)));
  }
}

struct Parent {
  base: Base,
}

impl Operation for Parent {
  const NAME: Option<&'static str> = Some("Parent");

  operation_base!();

  fn declare(steps: &mut Builder<Self>) {
    steps
      .operation("child", |_: &mut Self| MisdeclaredChild::call(Args::new()).map_err(anyhow::Error::from))
      .step("after", |_: &mut Self| Ok(()));
  }
}

#[test]
fn authoring_error_in_callee_escapes_the_caller() {
  setup_tracing();
  let direct = MisdeclaredChild::call(Args::new()).unwrap_err();
  assert!(matches!(direct, OpusError::UnrecognizedValidationOutcome { ref step, .. } if step == "check"));

  let err = Parent::call(Args::new()).unwrap_err();
  assert!(matches!(
    err,
    OpusError::UnrecognizedValidationOutcome { ref step, found: "a plain value" } if step == "check"
  ));
}
