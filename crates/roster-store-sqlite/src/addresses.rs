//! The address synchronizer.
//!
//! A Person's addresses are never patched. Every write deletes all of the
//! owner's link rows, inserts a fresh location and link per address in list
//! order, then prunes the old locations nothing links to any more.

use roster_core::{
  identity::InternalId,
  location::{Address, AddressLink, FIRST_ADDRESS_INDEX},
  query::{Predicate, StatementBuilder},
  table::{ADDRESS_LINKS, LOCATIONS},
};
use tracing::debug;

use crate::{
  Result,
  encode::{address_from_row, link_row},
  locations,
  uow::UnitOfWork,
};

/// Replace every address owned by `owner_id` with `addresses`, in order.
///
/// Indices are reassigned from [`FIRST_ADDRESS_INDEX`] by list position, and
/// each address's location id is set to its freshly inserted row. Runs in the
/// caller's unit of work so a later failure undoes it along with everything
/// else.
pub fn replace(
  uow: &UnitOfWork<'_>,
  owner_id: InternalId,
  addresses: &mut [Address],
) -> Result<()> {
  let owned_links = || {
    StatementBuilder::new(&ADDRESS_LINKS)
      .owned_by(uow.auth_id())
      .filter(Predicate::eq(&ADDRESS_LINKS, "entity_id", owner_id))
  };

  let stale_locations: Vec<InternalId> = uow.query_all(
    &owned_links().select(),
    "problem reading existing addresses",
    |row| row.get(StatementBuilder::label(&ADDRESS_LINKS, "location_id").as_str()),
  )?;

  let removed = uow.execute(&owned_links().delete(), "problem removing existing addresses")?;

  for (position, address) in (FIRST_ADDRESS_INDEX..).zip(addresses.iter_mut()) {
    let location_id = locations::insert(uow, &mut address.location)?;
    address.idx = position;

    let link = AddressLink {
      entity_id: owner_id,
      location_id,
      idx: position,
      label: address.label.clone(),
    };
    uow.execute(
      &StatementBuilder::new(&ADDRESS_LINKS).insert(&link_row(&link)),
      "problem creating address record",
    )?;
  }

  debug!(owner_id, removed, inserted = addresses.len(), "addresses replaced");
  locations::prune_orphans(uow, &stale_locations);
  Ok(())
}

/// Load the addresses owned by `owner_id`, ordered by index.
pub fn load(uow: &UnitOfWork<'_>, owner_id: InternalId) -> Result<Vec<Address>> {
  let stmt = StatementBuilder::new(&ADDRESS_LINKS)
    .join(&LOCATIONS, "id", "location_id")
    .owned_by(uow.auth_id())
    .filter(Predicate::eq(&ADDRESS_LINKS, "entity_id", owner_id))
    .order_by(&ADDRESS_LINKS, "idx")
    .select();

  uow.query_all(&stmt, "problem retrieving addresses", address_from_row)
}
