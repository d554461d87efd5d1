//! Failure reporting.
//!
//! Operations never log directly. They hand a [`FailureEvent`] to an injected
//! [`FailureSink`]; the binary wires in [`TracingSink`].

use std::fmt;

/// Which kind of store access failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
  Read,
  Write,
  Initialize,
}

impl fmt::Display for FailureKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Read => "read",
      Self::Write => "write",
      Self::Initialize => "initialize",
    })
  }
}

/// A store failure observed by an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureEvent {
  pub kind:      FailureKind,
  /// The operation that observed the failure, e.g. `"create"`.
  pub operation: &'static str,
  /// Entity name, e.g. `"Person"`.
  pub entity:    &'static str,
  /// Root-cause message of the store error.
  pub reason:    String,
}

pub trait FailureSink: Send + Sync {
  fn record(&self, event: FailureEvent);
}

/// Emits every failure as a structured `WARN` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl FailureSink for TracingSink {
  fn record(&self, event: FailureEvent) {
    tracing::warn!(
      kind = %event.kind,
      operation = event.operation,
      entity = event.entity,
      reason = %event.reason,
      "failed to {} {} in database",
      event.kind,
      event.entity,
    );
  }
}
