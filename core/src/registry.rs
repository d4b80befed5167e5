// opus/src/registry.rs

//! A process-wide, type-keyed registry of operation definitions.
//!
//! Each operation type's `Definition` is built on first use and shared by
//! every later call. Entries are stored type-erased and downcast on lookup.

use crate::core::operation::Operation;
use crate::pipeline::definition::Definition;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{event, Level};

type ErasedDefinition = Arc<dyn Any + Send + Sync>;

static DEFINITIONS: Lazy<RwLock<HashMap<TypeId, ErasedDefinition>>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Returns the definition of `O`, building it on first use.
pub fn definition<O: Operation>() -> Arc<Definition<O>> {
  let type_id = TypeId::of::<O>();

  let existing = DEFINITIONS.read().get(&type_id).cloned();
  let erased = match existing {
    Some(erased) => erased,
    None => {
      // Built outside the lock: `declare` may look up other operation types.
      let built: ErasedDefinition = Arc::new(Definition::<O>::new());
      let mut definitions = DEFINITIONS.write();
      let entry = definitions.entry(type_id).or_insert_with(|| {
        event!(Level::DEBUG, operation = %std::any::type_name::<O>(), "Registering operation definition.");
        built
      });
      Arc::clone(entry)
    }
  };

  match erased.downcast::<Definition<O>>() {
    Ok(definition) => definition,
    Err(_) => unreachable!("registry entry for {} holds another type", std::any::type_name::<O>()),
  }
}

/// Whether `O` has been used (and so declared) in this process.
pub fn is_registered<O: Operation>() -> bool {
  DEFINITIONS.read().contains_key(&TypeId::of::<O>())
}
