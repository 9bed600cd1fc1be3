//! Error types for `clinic-core`, plus the classification every store
//! backend reports its failures through.

use thiserror::Error;

use crate::appointment::AppointmentStatus;

#[derive(Debug, Error)]
pub enum Error {
  #[error("malformed date {0:?}, expected YYYY-MM-DD")]
  InvalidDate(String),

  #[error("malformed time {0:?}, expected HH:mm")]
  InvalidTime(String),

  #[error("patient name must not be empty")]
  EmptyPatientName,

  #[error("cannot move an appointment from {from} to {to}")]
  InvalidTransition {
    from: AppointmentStatus,
    to:   AppointmentStatus,
  },

  #[error("month out of range: {0}")]
  InvalidMonth(u32),

  #[error("year out of range: {0}")]
  InvalidYear(i32),

  #[error("utc offset out of range: {0} minutes")]
  InvalidOffset(i32),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Classification ──────────────────────────────────────────────────────────

/// Coarse failure class, independent of the backend that produced it.
///
/// Callers must never conflate [`ErrorKind::ReadFailed`] with an empty result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// The addressed record does not exist (or was already archived).
  NotFound,
  /// The input was malformed.
  Invalid,
  /// The input was well-formed but the current state forbids it.
  Rejected,
  /// A listing or lookup failed; the state is unknown.
  ReadFailed,
  /// A mutation failed; nothing was committed.
  WriteFailed,
}

impl ErrorKind {
  /// Whether a caller may reasonably retry the same call.
  pub fn is_retryable(self) -> bool {
    matches!(self, Self::ReadFailed | Self::WriteFailed)
  }
}

/// Implemented by every store backend error so higher layers can classify
/// failures without knowing the backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> ErrorKind;
}

impl StoreError for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::InvalidTransition { .. } => ErrorKind::Rejected,
      _ => ErrorKind::Invalid,
    }
  }
}
