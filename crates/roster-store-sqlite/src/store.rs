//! [`SqliteStore`]: the SQLite implementation of [`PersonStore`].

use std::{path::Path, sync::Arc};

use roster_core::{
  Error as CoreError,
  auth::{RequestContext, require_authentication},
  identity::{Identity, InternalId},
  person::{PERSONS_RESOURCE_NAME, Person},
  query::{ColumnExclusions, Predicate, StatementBuilder},
  store::PersonStore,
  table::PERSONS,
};
use tracing::{debug, instrument};

use crate::{
  Result, addresses,
  encode::{RawPerson, person_row},
  identity,
  schema::SCHEMA,
  uow::{UnitOfWork, in_transaction},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Roster person store backed by a single SQLite file.
///
/// A store fresh from [`SqliteStore::open`] is not bound to any request and
/// refuses every operation; bind one with [`SqliteStore::with_context`].
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
  context:         Option<RequestContext>,
  exclusions:      Arc<ColumnExclusions>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self {
      conn,
      context: None,
      exclusions: Arc::new(ColumnExclusions::identity_owned()),
    })
  }

  /// A handle on the same connection bound to `ctx` for one request.
  pub fn with_context(&self, ctx: RequestContext) -> Self {
    Self { context: Some(ctx), ..self.clone() }
  }

  /// Resolve the caller, then run `work` in one transaction on the
  /// connection thread.
  async fn run<T, F>(&self, work: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&UnitOfWork<'_>, &ColumnExclusions) -> Result<T> + Send + 'static,
  {
    let auth_id = require_authentication(self.context.as_ref())?;
    let ctx = self.context.clone().unwrap_or_default();
    let exclusions = Arc::clone(&self.exclusions);

    self
      .conn
      .call(move |conn| {
        Ok(in_transaction(conn, &ctx, &auth_id, |uow| work(uow, exclusions.as_ref())))
      })
      .await?
  }
}

// ─── Person steps ────────────────────────────────────────────────────────────

/// Whether the caller has ever created a Person, archived or not.
fn owned_person_exists(uow: &UnitOfWork<'_>) -> Result<bool> {
  let stmt = StatementBuilder::new(&PERSONS).owned_by(uow.auth_id()).including_archived().exists();
  uow.exists(&stmt, "problem verifying person existence")
}

/// The caller's live Person, without addresses.
fn owned_person(uow: &UnitOfWork<'_>) -> Result<Option<Person>> {
  let stmt = StatementBuilder::new(&PERSONS).owned_by(uow.auth_id()).select();
  uow
    .query_opt(&stmt, "problem retrieving person record", RawPerson::from_row)?
    .map(RawPerson::into_person)
    .transpose()
}

fn create_person(
  uow: &UnitOfWork<'_>,
  exclusions: &ColumnExclusions,
  mut person: Person,
) -> Result<Person> {
  if owned_person_exists(uow)? {
    return Err(CoreError::Conflict("self already exists".into()).into());
  }

  // The store, not the caller, decides who owns the new record and what it is.
  person.identity.auth_id = Some(uow.auth_id().to_owned());
  person.identity.active = true;
  person.identity.resource_name = PERSONS_RESOURCE_NAME.to_owned();
  person.identity.owner_id = None;
  person.normalize_phones()?;
  person.change_desc = None;

  let id = identity::create(uow, &mut person.identity)?;

  let stmt = StatementBuilder::new(&PERSONS)
    .excluding(exclusions.on_create())
    .insert(&person_row(&person));
  uow.execute(&stmt, "problem creating person record")?;

  let mut addresses = person.addresses.take().unwrap_or_default();
  addresses::replace(uow, id, &mut addresses)?;
  person.addresses = Some(addresses);
  person.normalize_addresses();

  Ok(person.format_out())
}

fn update_person(
  uow: &UnitOfWork<'_>,
  exclusions: &ColumnExclusions,
  mut person: Person,
) -> Result<Person> {
  let current = owned_person(uow)?
    .ok_or_else(|| CoreError::NotFound("no active self record to update".into()))?;
  let id: InternalId = current
    .identity
    .id
    .ok_or_else(|| CoreError::NotFound("no active self record to update".into()))?;

  if person.identity.id.is_some_and(|submitted| submitted != id) {
    return Err(CoreError::Forbidden("cannot update another person's record".into()).into());
  }

  // Only these identity fields are caller-editable; archive is the only way
  // to deactivate.
  person.identity = Identity {
    name: person.identity.name,
    description: person.identity.description,
    legal_id: person.identity.legal_id,
    legal_id_type: person.identity.legal_id_type,
    ..current.identity
  };
  person.normalize_phones()?;
  person.change_desc = None;

  for stmt in identity::update_statements(&mut person.identity, uow.auth_id()) {
    uow.execute(&stmt, "problem updating identity record")?;
  }

  let stmt = StatementBuilder::new(&PERSONS)
    .excluding(exclusions.on_update())
    .owned_by(uow.auth_id())
    .including_archived()
    .filter(Predicate::eq(&PERSONS, "id", id))
    .update(&person_row(&person));
  if uow.execute(&stmt, "problem updating person record")? == 0 {
    return Err(CoreError::NotFound("no active self record to update".into()).into());
  }

  let mut addresses = person.addresses.take().unwrap_or_default();
  addresses::replace(uow, id, &mut addresses)?;
  person.addresses = Some(addresses);
  person.normalize_addresses();

  Ok(person.format_out())
}

fn retrieve_person(uow: &UnitOfWork<'_>) -> Result<Person> {
  let mut person = owned_person(uow)?
    .ok_or_else(|| CoreError::NotFound("no active self record".into()))?;
  if let Some(id) = person.identity.id {
    person.addresses = Some(addresses::load(uow, id)?);
  }
  person.normalize_addresses();
  Ok(person.format_out())
}

// ─── PersonStore impl ────────────────────────────────────────────────────────

impl PersonStore for SqliteStore {
  type Error = crate::Error;

  #[instrument(skip_all)]
  async fn create_self(&self, person: Person) -> Result<Person> {
    let person = self.run(move |uow, ex| create_person(uow, ex, person)).await?;
    debug!(id = person.identity.id, "self created");
    Ok(person)
  }

  #[instrument(skip_all)]
  async fn retrieve_self(&self) -> Result<Person> {
    self.run(|uow, _| retrieve_person(uow)).await
  }

  #[instrument(skip_all)]
  async fn update_self(&self, person: Person) -> Result<Person> {
    let person = self.run(move |uow, ex| update_person(uow, ex, person)).await?;
    debug!(id = person.identity.id, "self updated");
    Ok(person)
  }

  #[instrument(skip_all)]
  async fn archive_self(&self) -> Result<()> {
    self.run(|uow, _| identity::archive(uow)).await
  }
}
