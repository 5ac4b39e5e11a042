//! Location rows: inserted fresh for every address write, pruned once nothing
//! links to them.

use roster_core::{
  identity::InternalId,
  location::Location,
  query::{Predicate, StatementBuilder, Value},
  table::{ADDRESS_LINKS, LOCATIONS},
};
use tracing::{debug, warn};

use crate::{Result, encode::location_row, error::StorageContext as _, uow::UnitOfWork};

/// Insert `location` as a new row and record the assigned id on it.
pub fn insert(uow: &UnitOfWork<'_>, location: &mut Location) -> Result<InternalId> {
  let stmt = StatementBuilder::new(&LOCATIONS).insert(&location_row(location));
  uow.execute(&stmt, "problem creating location record")?;
  let id = uow.tx().last_insert_rowid();
  location.id = Some(id);
  Ok(id)
}

/// Delete those of `candidates` that no address link references any more.
///
/// Best-effort: runs inside a savepoint, and on failure rolls back to it and
/// logs. Leftover rows only cost storage.
pub fn prune_orphans(uow: &UnitOfWork<'_>, candidates: &[InternalId]) {
  if candidates.is_empty() {
    return;
  }

  let stmt = StatementBuilder::new(&LOCATIONS)
    .filter(Predicate::is_in(
      &LOCATIONS,
      "id",
      candidates.iter().copied().map(Value::Integer).collect(),
    ))
    .filter(Predicate::unreferenced(&LOCATIONS, "id", &ADDRESS_LINKS, "location_id"))
    .delete();

  let attempt = || -> Result<usize> {
    uow.tx().execute_batch("SAVEPOINT prune_locations").context("problem opening savepoint")?;
    match uow.execute(&stmt, "problem pruning orphaned locations") {
      Ok(n) => {
        uow.tx().execute_batch("RELEASE prune_locations").context("problem releasing savepoint")?;
        Ok(n)
      }
      Err(e) => {
        uow
          .tx()
          .execute_batch("ROLLBACK TO prune_locations; RELEASE prune_locations")
          .context("problem rolling back savepoint")?;
        Err(e)
      }
    }
  };

  match attempt() {
    Ok(pruned) => debug!(pruned, "orphaned locations pruned"),
    Err(error) => warn!(%error, "orphaned location cleanup failed"),
  }
}
