// opus_core/examples/basic_operation.rs

use opus::{Args, Base, Builder, Operation, OpusError, Validation};
use serde_json::{json, Value};
use tracing::info;

// 1. Define the operation type: it owns a `Base` holding the per-call state.
struct RegisterProfile {
  base: Base,
}

// 2. Declare its instructions once; they are shared by every call.
impl Operation for RegisterProfile {
  const NAME: Option<&'static str> = Some("RegisterProfile");

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
      .validate("schema", Self::schema)
      .step("build_profile", Self::build_profile)
      .finish_if("is_dry_run", Self::is_dry_run)
      .benchmark("persist", Self::persist)
      .step("output", Self::output);
  }
}

impl RegisterProfile {
  fn schema(&mut self) -> anyhow::Result<Validation> {
    Ok(
      Validation::new(self.params().clone())
        .check("email", |email| email.as_str().is_some_and(|e| e.contains('@')), "must be an email")
        .check("name", |name| name.as_str().is_some_and(|n| !n.is_empty()), "must be present"),
    )
  }

  fn build_profile(&mut self) -> anyhow::Result<()> {
    let validated = self.context().output_of("schema").cloned().unwrap_or(Value::Null);
    self.context_mut().insert("profile", json!({ "email": validated["email"], "name": validated["name"] }));
    Ok(())
  }

  fn is_dry_run(&mut self) -> anyhow::Result<bool> {
    Ok(self.params().get("dry_run") == Some(&json!(true)))
  }

  fn persist(&mut self) -> anyhow::Result<()> {
    info!("Persisting profile");
    self.context_mut().insert("profile_id", 102);
    Ok(())
  }

  fn output(&mut self) -> anyhow::Result<()> {
    let id = self.context().get("profile_id").cloned().unwrap_or(Value::Null);
    self.result_mut().set_output(json!({ "id": id }));
    Ok(())
  }
}

fn main() -> Result<(), OpusError> {
  // Initialize tracing (optional, for demonstration)
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Basic Operation Example ---");

  // 3. Call it: every call gets a fresh context and result.
  let result = RegisterProfile::call(Args::new().param("email", "jane@example.com").param("name", "Jane"))?;
  info!("Success: {}, output: {}", result.is_success(), result.output());
  info!("Executions: {}", serde_json::to_string(result.executions()).unwrap_or_default());
  info!("Timings: {}", serde_json::Value::Object(result.information().clone()));
  assert_eq!(result.output_checked()?, &json!({ "id": 102 }));

  let invalid = RegisterProfile::call(Args::new().param("email", "nope"))?;
  info!("Failure errors: {:?}", invalid.errors());
  assert!(invalid.is_failure());
  assert_eq!(invalid.errors().len(), 2);

  let dry_run = RegisterProfile::call(
    Args::new()
      .param("email", "jane@example.com")
      .param("name", "Jane")
      .param("dry_run", true),
  )?;
  info!("Dry run finished early with output {}", dry_run.output());
  assert!(dry_run.is_success());

  Ok(())
}
