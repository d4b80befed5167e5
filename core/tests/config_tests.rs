// tests/config_tests.rs
#[macro_use]
mod common;

use common::*;
use opus::{Args, Base, Builder, Config, InstrumentationLevel, Mode, Operation, OpusError, PassthroughTransaction};
use serial_test::serial;
use std::sync::Arc;

struct Plain {
  base: Base,
}

impl Operation for Plain {
  const NAME: Option<&'static str> = Some("Plain");

  operation_base!();

  fn declare(steps: &mut Builder<Self>) {
    steps
      .step("step_1", |_: &mut Self| Ok(()))
      .step("step_2", |op: &mut Self| {
        op.result_mut().set_output("done");
        Ok(())
      });
  }
}

#[test]
#[serial]
fn global_defaults_are_inherited_on_first_use() {
  setup_tracing();

  struct Inheriting {
    base: Base,
  }

  impl Operation for Inheriting {
    operation_base!();

    fn declare(steps: &mut Builder<Self>) {
      steps.transaction_block(|t| {
        t.step("write", |_: &mut Self| Ok(()));
      });
    }
  }

  Config::configure_global(|config| {
    config.transaction_backend = Some(Arc::new(PassthroughTransaction));
    config.transaction_method = "atomic".to_string();
  })
  .unwrap();
  let inherited = Inheriting::definition().config();
  Config::reset_global();

  assert_eq!(inherited.transaction_method, "atomic");
  assert!(inherited.transaction_backend.is_some());

  let result = Inheriting::call(Args::new()).unwrap();
  assert!(result.is_success());
  assert_eq!(step_names(&result), vec!["write"]);
}

#[test]
#[serial]
fn invalid_global_edit_is_discarded() {
  setup_tracing();
  let err = Config::configure_global(|config| config.instrumentation_method = String::new()).unwrap_err();

  assert!(matches!(
    err,
    OpusError::InvalidConfig {
      option: "instrumentation_method",
      ..
    }
  ));
  assert_eq!(Config::global().instrumentation_method, "instrument");
}

#[test]
#[serial]
fn type_configuration_overrides_global_defaults() {
  setup_tracing();

  struct Terse {
    base: Base,
  }

  impl Operation for Terse {
    operation_base!();

    fn configure(config: &mut Config) {
      config.mode = "production".parse().unwrap_or_default();
    }

    fn declare(steps: &mut Builder<Self>) {
      steps.step("step_1", |op: &mut Self| {
        op.result_mut().set_output(1);
        Ok(())
      });
    }
  }

  let result = Terse::call(Args::new()).unwrap();
  assert_eq!(Terse::definition().config().mode, Mode::Production);
  assert!(result.executions().is_empty());
  assert_eq!(result.output(), &serde_json::json!(1));
  assert_eq!(Config::global().mode, Mode::Development);
}

#[test]
#[serial]
fn operation_level_instrumentation_wraps_the_call() {
  setup_tracing();

  struct Traced {
    base: Base,
  }

  impl Operation for Traced {
    const NAME: Option<&'static str> = Some("Traced");

    operation_base!();

    fn declare(steps: &mut Builder<Self>) {
      steps.step("step_1", |_: &mut Self| Ok(())).step("step_2", |_: &mut Self| Ok(()));
    }
  }

  let instrumentation = Arc::new(RecordingInstrumentation::default());
  let backend = Arc::clone(&instrumentation);
  Traced::definition()
    .configure(|config| config.instrumentation_backend = Some(backend))
    .unwrap();

  let result = Traced::call(Args::new()).unwrap();
  assert!(result.is_success());
  assert_eq!(instrumentation.traces(), vec!["instrument:Traced"]);
}

#[test]
#[serial]
fn step_level_instrumentation_wraps_every_step() {
  setup_tracing();

  struct StepTraced {
    base: Base,
  }

  impl Operation for StepTraced {
    const NAME: Option<&'static str> = Some("StepTraced");

    operation_base!();

    fn declare(steps: &mut Builder<Self>) {
      steps.step("step_1", |_: &mut Self| Ok(())).step("step_2", |_: &mut Self| Ok(()));
    }
  }

  let instrumentation = Arc::new(RecordingInstrumentation::default());
  let backend = Arc::clone(&instrumentation);
  StepTraced::definition()
    .configure(|config| {
      config.instrumentation_backend = Some(backend);
      config.instrumentation_method = "trace".to_string();
      config.instrumentation_level = InstrumentationLevel::Step;
    })
    .unwrap();

  StepTraced::call(Args::new()).unwrap();
  assert_eq!(
    instrumentation.traces(),
    vec!["trace:StepTraced", "trace:#step_1", "trace:#step_2"]
  );
}

#[test]
#[serial]
fn instrumentation_that_never_yields_skips_the_work() {
  setup_tracing();

  struct Skipped {
    base: Base,
  }

  impl Operation for Skipped {
    operation_base!();

    fn configure(config: &mut Config) {
      config.instrumentation_backend = Some(Arc::new(SkippingInstrumentation));
    }

    fn declare(steps: &mut Builder<Self>) {
      steps.step("step_1", |op: &mut Self| {
        op.result_mut().set_output("ran");
        Ok(())
      });
    }
  }

  let result = Skipped::call(Args::new()).unwrap();
  assert!(result.is_success());
  assert!(result.executions().is_empty());
  assert_eq!(result.output(), &serde_json::Value::Null);
}

#[test]
#[serial]
fn reporter_receives_faults() {
  setup_tracing();

  struct Reported {
    base: Base,
  }

  impl Operation for Reported {
    operation_base!();

    fn declare(steps: &mut Builder<Self>) {
      steps.step("explode", |_: &mut Self| -> anyhow::Result<()> { anyhow::bail!("kaboom") });
    }
  }

  let reporter = Arc::new(RecordingReporter::default());
  let sink = Arc::clone(&reporter);
  Reported::definition().configure(|config| config.reporter = Some(sink)).unwrap();

  let result = Reported::call(Args::new()).unwrap();
  assert_eq!(reporter.errors(), vec!["kaboom"]);
  assert_eq!(result.exceptions()["explode"], vec!["kaboom".to_string()]);
}

#[test]
#[serial]
fn panicking_reporter_does_not_escape() {
  setup_tracing();

  struct Unlucky {
    base: Base,
  }

  impl Operation for Unlucky {
    operation_base!();

    fn configure(config: &mut Config) {
      config.reporter = Some(Arc::new(PanickingReporter));
    }

    fn declare(steps: &mut Builder<Self>) {
      steps.step("explode", |_: &mut Self| -> anyhow::Result<()> { anyhow::bail!("kaboom") });
    }
  }

  let result = Unlucky::call(Args::new()).unwrap();
  assert!(result.is_failure());
  assert_eq!(result.exceptions()["explode"], vec!["kaboom".to_string()]);
}

#[test]
#[serial]
fn plain_operation_uses_defaults() {
  setup_tracing();
  let config = Plain::definition().config();
  assert!(config.transaction_backend.is_none());
  assert_eq!(config.instrumentation_level, InstrumentationLevel::Operation);

  let result = Plain::call(Args::new()).unwrap();
  assert_eq!(result.output(), &serde_json::json!("done"));
  assert_eq!(step_names(&result), vec!["step_1", "step_2"]);
}
