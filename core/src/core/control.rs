// opus/src/core/control.rs

//! Defines when a walk over an instruction list stops early.

/// Break condition checked after every instruction of a list.
///
/// Both conditions read state shared by every nesting level (the finished flag
/// and the accumulated result), so a break inside a nested list is seen again by
/// the enclosing list once control returns to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BreakPolicy {
  /// Stop once the operation finished or the result holds any failure.
  #[default]
  FinishedOrFailure,
  /// Stop only on an explicit finish. Used by `validate` and `success` groups
  /// so every member runs and all failures are collected in one pass.
  FinishedOnly,
}

impl BreakPolicy {
  pub fn should_break(self, finished: bool, failed: bool) -> bool {
    match self {
      BreakPolicy::FinishedOrFailure => finished || failed,
      BreakPolicy::FinishedOnly => finished,
    }
  }
}
