//! The identity sub-aggregate: the `users` rows every Person extends.
//!
//! Person writes never touch identity columns directly; they call into here
//! with the same unit of work so both land in one transaction.

use chrono::Utc;
use roster_core::{
  Error as CoreError,
  identity::{Identity, InternalId},
  query::{Row, Statement, StatementBuilder},
  table::IDENTITY,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{encode_dt, identity_row},
  error::is_unique_violation,
  uow::UnitOfWork,
};

/// Columns set once at create and never rewritten by an update.
const IMMUTABLE: &[&str] = &[
  "id",
  "pub_id",
  "resource_name",
  "owner_id",
  "auth_id",
  "created_at",
  "deleted_at",
];

/// Insert `identity`, filling in its id, public id, and timestamps.
pub fn create(uow: &UnitOfWork<'_>, identity: &mut Identity) -> Result<InternalId> {
  let now = Utc::now();
  identity.id = None;
  identity.pub_id = Some(Uuid::new_v4());
  identity.created_at = Some(now);
  identity.updated_at = Some(now);
  identity.deleted_at = None;

  let stmt = StatementBuilder::new(&IDENTITY).excluding(&["id"]).insert(&identity_row(identity));
  uow.execute(&stmt, "problem creating identity record").map_err(|e| match e {
    Error::Storage { source, .. } if is_unique_violation(&source) => {
      CoreError::Conflict("self already exists".into()).into()
    }
    other => other,
  })?;

  let id = uow.tx().last_insert_rowid();
  identity.id = Some(id);
  debug!(id, "identity created");
  Ok(id)
}

/// Statements that write the caller-editable identity columns, scoped to the
/// caller's own live identity. Stamps `updated_at` on `identity`.
pub fn update_statements(identity: &mut Identity, auth_id: &str) -> Vec<Statement> {
  identity.updated_at = Some(Utc::now());
  vec![
    StatementBuilder::new(&IDENTITY)
      .excluding(IMMUTABLE)
      .owned_by(auth_id)
      .update(&identity_row(identity)),
  ]
}

/// Soft-delete the caller's live identity.
pub fn archive(uow: &UnitOfWork<'_>) -> Result<()> {
  let now = Utc::now();
  let row = Row::new()
    .set("active", false)
    .set("updated_at", encode_dt(now))
    .set("deleted_at", encode_dt(now));
  let stmt = StatementBuilder::new(&IDENTITY).owned_by(uow.auth_id()).update(&row);

  if uow.execute(&stmt, "problem archiving identity record")? == 0 {
    return Err(CoreError::NotFound("no active self record to archive".into()).into());
  }
  debug!("identity archived");
  Ok(())
}
