pub mod context;
pub mod control;
pub mod inputs;
pub mod operation;
pub mod step;

// Re-export key types for easier access from other opus modules (and lib.rs)
pub use context::Context;
pub use control::BreakPolicy;
pub use inputs::{Args, Dependencies, Params};
pub use operation::{Base, Operation};
pub use step::{StepDef, StepHandler, StepValue};
