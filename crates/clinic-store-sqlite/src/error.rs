//! Error type for `clinic-store-sqlite`.

use clinic_core::{ErrorKind, StoreError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] clinic_core::Error),

  #[error("failed to open database: {0}")]
  Open(#[source] tokio_rusqlite::Error),

  #[error("read failed: {0}")]
  Read(#[source] tokio_rusqlite::Error),

  #[error("write failed: {0}")]
  Write(#[source] tokio_rusqlite::Error),

  /// A statement inside a multi-step write failed; the transaction was
  /// rolled back.
  #[error("transaction failed: {0}")]
  Transaction(#[from] rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("malformed stored value: {0}")]
  Decode(String),

  /// Also returned when the appointment was already archived.
  #[error("appointment not found: {0}")]
  AppointmentNotFound(Uuid),

  #[error("message not found: {0}")]
  MessageNotFound(Uuid),

  #[error("profile not found: {0}")]
  ProfileNotFound(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl StoreError for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::Core(e) => e.kind(),
      Self::AppointmentNotFound(_)
      | Self::MessageNotFound(_)
      | Self::ProfileNotFound(_) => ErrorKind::NotFound,
      Self::Open(_) | Self::Read(_) | Self::Uuid(_) | Self::Decode(_) => {
        ErrorKind::ReadFailed
      }
      Self::Write(_) | Self::Transaction(_) => ErrorKind::WriteFailed,
    }
  }
}
