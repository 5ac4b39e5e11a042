//! Error type for `roster-store-sqlite`.

use roster_core::{ErrorKind, store::StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Authorization, forbidden, conflict, not-found, and validation failures.
  #[error(transparent)]
  Core(#[from] roster_core::Error),

  /// A statement failed; `context` names the operation that issued it.
  #[error("{context}: {source}")]
  Storage {
    context: &'static str,
    #[source]
    source:  rusqlite::Error,
  },

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// The request context's deadline passed; the transaction was rolled back.
  #[error("{0}: request context expired")]
  Cancelled(&'static str),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Core(e) => e.kind(),
      _ => ErrorKind::Storage,
    }
  }
}

impl StoreError for Error {
  fn kind(&self) -> ErrorKind { Error::kind(self) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Attach an operation name to a failed statement.
pub(crate) trait StorageContext<T> {
  fn context(self, context: &'static str) -> Result<T>;
}

impl<T> StorageContext<T> for rusqlite::Result<T> {
  fn context(self, context: &'static str) -> Result<T> {
    self.map_err(|source| Error::Storage { context, source })
  }
}

/// True for a `UNIQUE` constraint violation.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}
