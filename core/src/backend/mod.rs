// opus/src/backend/mod.rs

//! Contracts for the collaborators the engine drives but does not implement:
//! transaction backends, instrumentation, error reporters and validation
//! outcomes. Each module also ships a small default implementation.

pub mod instrumentation;
pub mod reporter;
pub mod transaction;
pub mod validation;

pub use instrumentation::{Instrumentation, TracingInstrumentation};
pub use reporter::{Reporter, TracingReporter};
pub use transaction::{FnTransaction, PassthroughTransaction, TransactionBackend};
pub use validation::{Validation, ValidationOutcome};
