pub mod definition;
pub(crate) mod execution;

mod benchmark;
mod flow;
mod sub_operation;
mod transaction;
mod validate;

pub use definition::Definition;
