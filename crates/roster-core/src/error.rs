//! Error types for `roster-core`.

use thiserror::Error;

/// Coarse classification shared by every crate's error type, so callers can
/// map failures to exit codes or status codes without matching on variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// No request context reached the store; a server misconfiguration.
  Authorization,
  /// A context is present but carries no authenticated identity.
  Forbidden,
  /// The caller's self record already exists.
  Conflict,
  /// The caller has no active self record.
  NotFound,
  /// The input could not be decoded or was rejected.
  Validation,
  /// Any failure of the underlying store.
  Storage,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("authorization error: {0}")]
  Authorization(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("validation error: {0}")]
  Validation(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Authorization(_) => ErrorKind::Authorization,
      Self::Forbidden(_) => ErrorKind::Forbidden,
      Self::Conflict(_) => ErrorKind::Conflict,
      Self::NotFound(_) => ErrorKind::NotFound,
      Self::Validation(_) | Self::Serialization(_) => ErrorKind::Validation,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
