//! The `PersonStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `roster-store-sqlite`).
//! Every operation acts only on the record owned by the caller whose identity
//! was bound to the store through a [`crate::auth::RequestContext`]; none of
//! them take a person id to look up.

use std::future::Future;

use crate::{ErrorKind, person::Person};

/// Classification hook so callers can act on a backend's errors without
/// knowing the backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> ErrorKind;
}

/// Self-service persistence of the Person aggregate.
///
/// Each method runs in exactly one transaction: it either commits every row
/// it touched or none of them.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes.
pub trait PersonStore: Send + Sync {
  type Error: StoreError;

  /// Create the caller's own Person, including its identity row and initial
  /// addresses. Fails with a conflict if the caller already has one, even an
  /// archived one.
  ///
  /// Returns the Person as persisted, with store-assigned ids, timestamps,
  /// and address indices filled in.
  fn create_self(
    &self,
    person: Person,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Load the caller's own active Person with its addresses, formatted for
  /// output.
  fn retrieve_self(&self) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Overwrite the caller's own Person. The address list is fully replaced.
  fn update_self(
    &self,
    person: Person,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Soft-delete the caller's own Person. There is no way back.
  fn archive_self(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
