// opus/src/pipeline/definition.rs

//! Contains `Definition<O>`, the per-type declaration context: the instruction
//! list collected from `Operation::declare` (frozen on first call) and the
//! type's configuration.

use crate::config::{Config, InstrumentationLevel};
use crate::core::inputs::Args;
use crate::core::operation::{Base, Operation};
use crate::error::{OpusError, OpusResult};
use crate::instruction::builder::Builder;
use crate::instruction::Instruction;
use crate::pipeline::execution::{Executor, Scope};
use crate::result::OperationResult;
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::sync::Arc;
use tracing::{event, instrument, Level};

struct Declarations<O: 'static> {
  instructions: Vec<Instruction<O>>,
  sealed: bool,
}

pub struct Definition<O: Operation> {
  pending: Mutex<Declarations<O>>,
  frozen: OnceCell<Arc<[Instruction<O>]>>,
  config: OnceCell<RwLock<Config>>,
}

impl<O: Operation> Definition<O> {
  /// Collects the type's declarations. The registry builds one per type.
  pub(crate) fn new() -> Self {
    let mut builder = Builder::new();
    O::declare(&mut builder);
    event!(
      Level::DEBUG,
      operation = %std::any::type_name::<O>(),
      num_instructions = builder.len(),
      "Operation declared."
    );

    Self {
      pending: Mutex::new(Declarations {
        instructions: builder.into_instructions(),
        sealed: false,
      }),
      frozen: OnceCell::new(),
      config: OnceCell::new(),
    }
  }

  /// Appends more instructions after the ones already declared.
  ///
  /// Fails with `DefinitionFrozen` once the type has been called.
  pub fn declare(&self, declare: impl FnOnce(&mut Builder<O>)) -> OpusResult<()> {
    let mut builder = Builder::new();
    declare(&mut builder);

    let mut pending = self.pending.lock();
    if pending.sealed {
      event!(Level::ERROR, operation = %std::any::type_name::<O>(), "Declaration attempted on a frozen definition.");
      return Err(OpusError::DefinitionFrozen {
        operation: std::any::type_name::<O>().to_string(),
      });
    }
    pending.instructions.extend(builder.into_instructions());
    Ok(())
  }

  /// The frozen instruction list. The first access seals the definition.
  pub fn instructions(&self) -> Arc<[Instruction<O>]> {
    let frozen = self.frozen.get_or_init(|| {
      let mut pending = self.pending.lock();
      pending.sealed = true;
      event!(
        Level::DEBUG,
        operation = %std::any::type_name::<O>(),
        num_instructions = pending.instructions.len(),
        "Definition frozen."
      );
      Arc::from(std::mem::take(&mut pending.instructions))
    });
    Arc::clone(frozen)
  }

  pub fn is_frozen(&self) -> bool {
    self.frozen.get().is_some()
  }

  /// JSON outline of the instruction tree, as `Instruction::to_outline`.
  pub fn outline(&self) -> Value {
    Value::Array(self.instructions().iter().map(Instruction::to_outline).collect())
  }

  fn config_cell(&self) -> &RwLock<Config> {
    self.config.get_or_init(|| {
      let mut config = Config::inherited();
      O::configure(&mut config);
      RwLock::new(config)
    })
  }

  /// A snapshot of this type's configuration.
  pub fn config(&self) -> Config {
    self.config_cell().read().clone()
  }

  /// Edits this type's configuration. The edit is discarded if the result
  /// does not validate.
  pub fn configure(&self, edit: impl FnOnce(&mut Config)) -> OpusResult<()> {
    let cell = self.config_cell();
    let mut candidate = cell.read().clone();
    edit(&mut candidate);
    candidate.validate()?;
    *cell.write() = candidate;
    Ok(())
  }

  /// Runs one call of the operation with a fresh instance.
  ///
  /// `Err` is reserved for authoring and configuration errors; runtime faults
  /// and domain failures are reported through the returned result.
  #[instrument(
    name = "Definition::call",
    skip_all,
    fields(operation = %std::any::type_name::<O>()),
    err(Display)
  )]
  pub fn call(&self, args: Args) -> OpusResult<OperationResult> {
    let instructions = self.instructions();
    let config = self.config();
    config.validate()?;

    event!(Level::DEBUG, num_instructions = instructions.len(), "Operation call starting.");

    let mut operation = O::new(Base::new(args));
    let trace_name = O::NAME.unwrap_or_else(std::any::type_name::<O>);
    let walked = config.instrument(trace_name, InstrumentationLevel::Operation, || {
      Executor::new(&mut operation, &config).evaluate_instructions(&instructions, Scope::ROOT)
    });

    match walked {
      Some(outcome) => outcome?,
      None => {
        event!(Level::WARN, "Instrumentation skipped the operation; returning an empty result.");
      }
    }

    let result = operation.base_mut().take_result();
    event!(
      Level::DEBUG,
      success = result.is_success(),
      finished = operation.is_finished(),
      "Operation call completed."
    );
    Ok(result)
  }
}

// Instructions hold closures; print the outline shape instead.
impl<O: Operation> std::fmt::Debug for Definition<O> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Definition")
      .field("operation", &std::any::type_name::<O>())
      .field("frozen", &self.is_frozen())
      .field("config", &self.config.get().map(|config| config.read().clone()))
      .finish()
  }
}
