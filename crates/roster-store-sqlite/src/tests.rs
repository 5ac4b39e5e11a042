//! Integration tests for `SqliteStore` against an in-memory database.

use std::time::Instant;

use roster_core::{
  ErrorKind,
  auth::RequestContext,
  identity::Identity,
  location::{Address, Location},
  person::{PERSONS_RESOURCE_NAME, Person},
  store::PersonStore,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn as_caller(s: &SqliteStore, auth_id: &str) -> SqliteStore {
  s.with_context(RequestContext::authenticated(auth_id))
}

async fn count(s: &SqliteStore, table: &'static str) -> i64 {
  s.conn
    .call(move |c| Ok(c.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?))
    .await
    .unwrap()
}

async fn exec(s: &SqliteStore, sql: &'static str) {
  s.conn
    .call(move |c| {
      c.execute_batch(sql)?;
      Ok(())
    })
    .await
    .unwrap();
}

fn bob() -> Person {
  Person {
    given_name: "Robert".into(),
    family_name: "Woodward".into(),
    email: "bob@example.com".into(),
    phone: "5555555555".into(),
    ..Person::new(Identity::new(PERSONS_RESOURCE_NAME, "Bob Woodward", "reporter", true))
  }
}

fn address(label: &str, address1: &str, city: &str, state: &str) -> Address {
  Address::new(
    Location {
      address1: address1.into(),
      city: city.into(),
      state: state.into(),
      zip: "20001".into(),
      ..Default::default()
    },
    label,
  )
}

fn home() -> Address { address("Home", "1 Main St", "Washington", "DC") }

fn vacation() -> Address { address("Vacation", "9 Beach Rd", "Nags Head", "NC") }

// ─── Create / retrieve ───────────────────────────────────────────────────────

#[tokio::test]
async fn create_then_retrieve_round_trips() {
  let s = as_caller(&store().await, "auth0|bob");

  let created = s.create_self(bob()).await.unwrap();
  assert!(created.identity.id.is_some());
  assert!(created.identity.pub_id.is_some());
  assert_eq!(created.identity.auth_id.as_deref(), Some("auth0|bob"));
  assert_eq!(created.identity.resource_name, PERSONS_RESOURCE_NAME);

  let fetched = s.retrieve_self().await.unwrap();
  assert!(fetched.same_profile(&created));
  assert_eq!(fetched.identity.id, created.identity.id);
  assert_eq!(fetched.identity.pub_id, created.identity.pub_id);
  assert!(fetched.change_desc.is_none());
}

#[tokio::test]
async fn retrieve_without_addresses_is_canonically_empty_and_formatted() {
  let s = as_caller(&store().await, "auth0|bob");
  s.create_self(bob()).await.unwrap();

  let fetched = s.retrieve_self().await.unwrap();
  assert_eq!(fetched.given_name, "Robert");
  assert_eq!(fetched.family_name, "Woodward");
  assert!(fetched.addresses.is_none());
  assert_eq!(fetched.phone, "555-555-5555");
}

#[tokio::test]
async fn phones_are_stored_as_bare_digits() {
  let s = as_caller(&store().await, "auth0|bob");
  let person = Person {
    phone: "(555) 123-4567".into(),
    backup_phone: "555.987.6543".into(),
    ..bob()
  };
  s.create_self(person).await.unwrap();

  let stored: (String, String) = s
    .conn
    .call(|c| {
      Ok(c.query_row("SELECT phone, backup_phone FROM persons", [], |r| Ok((r.get(0)?, r.get(1)?)))?)
    })
    .await
    .unwrap();
  assert_eq!(stored, ("5551234567".to_owned(), "5559876543".to_owned()));

  let fetched = s.retrieve_self().await.unwrap();
  assert_eq!(fetched.phone, "555-123-4567");
  assert_eq!(fetched.backup_phone, "555-987-6543");
}

#[tokio::test]
async fn phone_with_extension_is_rejected() {
  let s = as_caller(&store().await, "auth0|bob");
  let person = Person { phone: "555-555-5555 x12".into(), ..bob() };
  let err = s.create_self(person).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
  assert_eq!(count(&s, "users").await, 0);

  s.create_self(bob()).await.unwrap();
  let person = Person {
    backup_phone: "555-555-5555 x12".into(),
    ..s.retrieve_self().await.unwrap()
  };
  let err = s.update_self(person).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
  assert_eq!(s.retrieve_self().await.unwrap().backup_phone, "");
}

#[tokio::test]
async fn create_with_two_addresses_keeps_order() {
  let s = as_caller(&store().await, "auth0|bob");
  let person = Person { addresses: Some(vec![home(), vacation()]), ..bob() };

  let created = s.create_self(person).await.unwrap();
  let owner = created.identity.id.unwrap();
  assert_eq!(created.addresses().len(), 2);

  let fetched = s.retrieve_self().await.unwrap();
  let addresses = fetched.addresses.as_deref().unwrap();
  assert_eq!(addresses.len(), 2);
  assert_eq!(addresses[0].idx, 1);
  assert_eq!(addresses[0].label, "Home");
  assert!(addresses[0].location.same_place(&home().location));
  assert_eq!(addresses[1].idx, 2);
  assert_eq!(addresses[1].label, "Vacation");
  assert!(addresses[1].location.same_place(&vacation().location));
  assert!(addresses.iter().all(|a| a.location.id.is_some()));
  assert!(addresses.iter().zip(created.addresses()).all(|(a, b)| a.same_entry(b)));

  let owners: Vec<i64> = s
    .conn
    .call(|c| {
      let mut stmt = c.prepare("SELECT entity_id FROM address_links ORDER BY idx")?;
      let rows = stmt.query_map([], |r| r.get(0))?.collect::<rusqlite::Result<Vec<_>>>()?;
      Ok(rows)
    })
    .await
    .unwrap();
  assert_eq!(owners, vec![owner, owner]);
}

#[tokio::test]
async fn caller_supplied_indices_are_reassigned() {
  let s = as_caller(&store().await, "auth0|bob");
  let mut first = home();
  first.idx = 7;
  let mut second = vacation();
  second.idx = 3;

  let person = Person { addresses: Some(vec![first, second]), ..bob() };
  let created = s.create_self(person).await.unwrap();
  let indices: Vec<i64> = created.addresses().iter().map(|a| a.idx).collect();
  assert_eq!(indices, vec![1, 2]);
}

#[tokio::test]
async fn create_twice_conflicts() {
  let s = as_caller(&store().await, "auth0|bob");
  s.create_self(bob()).await.unwrap();

  let err = s.create_self(bob()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);
  assert_eq!(count(&s, "users").await, 1);
  assert_eq!(count(&s, "persons").await, 1);
}

#[tokio::test]
async fn unique_auth_id_race_surfaces_as_conflict() {
  let s = as_caller(&store().await, "auth0|bob");
  // An identity row without a person row passes the existence check.
  exec(
    &s,
    "INSERT INTO users (pub_id, resource_name, auth_id, created_at, updated_at)
     VALUES ('00000000-0000-4000-8000-000000000000', 'persons', 'auth0|bob',
             '2024-01-01T00:00:00+00:00', '2024-01-01T00:00:00+00:00');",
  )
  .await;

  let err = s.create_self(bob()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);
  assert_eq!(count(&s, "persons").await, 0);
}

#[tokio::test]
async fn retrieve_without_record_is_not_found() {
  let s = as_caller(&store().await, "auth0|nobody");
  let err = s.retrieve_self().await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ─── Authorization ───────────────────────────────────────────────────────────

#[tokio::test]
async fn unbound_store_is_an_authorization_error() {
  let s = store().await;
  let err = s.retrieve_self().await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Authorization);
  let err = s.create_self(bob()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Authorization);
  assert_eq!(count(&s, "users").await, 0);
}

#[tokio::test]
async fn unauthenticated_context_is_forbidden_and_writes_nothing() {
  let base = store().await;
  let s = base.with_context(RequestContext::new());

  let err = s.create_self(bob()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Forbidden);
  let err = s.archive_self().await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Forbidden);
  let empty_id = base.with_context(RequestContext::authenticated(""));
  let err = empty_id.create_self(bob()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Forbidden);

  assert_eq!(count(&s, "users").await, 0);
  assert_eq!(count(&s, "persons").await, 0);
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_changes_fields_and_replaces_addresses() {
  let s = as_caller(&store().await, "auth0|bob");
  s.create_self(Person { addresses: Some(vec![home(), vacation()]), ..bob() }).await.unwrap();

  let mut person = s.retrieve_self().await.unwrap();
  person.email = "woodward@example.com".into();
  person.identity.description = "editor".into();
  person.addresses = Some(vec![address("Work", "1150 15th St NW", "Washington", "DC")]);
  s.update_self(person).await.unwrap();

  let fetched = s.retrieve_self().await.unwrap();
  assert_eq!(fetched.email, "woodward@example.com");
  assert_eq!(fetched.identity.description, "editor");
  assert_eq!(fetched.addresses().len(), 1);
  assert_eq!(fetched.addresses()[0].label, "Work");
  assert_eq!(fetched.addresses()[0].idx, 1);

  assert_eq!(count(&s, "address_links").await, 1);
  assert_eq!(count(&s, "locations").await, 1);
}

#[tokio::test]
async fn update_is_idempotent() {
  let s = as_caller(&store().await, "auth0|bob");
  s.create_self(Person { addresses: Some(vec![home(), vacation()]), ..bob() }).await.unwrap();
  let person = s.retrieve_self().await.unwrap();

  s.update_self(person.clone()).await.unwrap();
  let once = s.retrieve_self().await.unwrap();
  s.update_self(person).await.unwrap();
  let twice = s.retrieve_self().await.unwrap();

  assert!(once.same_profile(&twice));
  assert_eq!(twice.addresses().len(), 2);
  assert_eq!(count(&s, "address_links").await, 2);
  assert_eq!(count(&s, "locations").await, 2);
}

#[tokio::test]
async fn update_with_empty_addresses_clears_them() {
  let s = as_caller(&store().await, "auth0|bob");
  s.create_self(Person { addresses: Some(vec![home()]), ..bob() }).await.unwrap();

  let person = Person { addresses: Some(Vec::new()), ..s.retrieve_self().await.unwrap() };
  let updated = s.update_self(person).await.unwrap();
  assert!(updated.addresses.is_none());

  assert!(s.retrieve_self().await.unwrap().addresses.is_none());
  assert_eq!(count(&s, "address_links").await, 0);
  assert_eq!(count(&s, "locations").await, 0);
}

#[tokio::test]
async fn update_cannot_change_ownership_fields() {
  let s = as_caller(&store().await, "auth0|bob");
  let created = s.create_self(bob()).await.unwrap();

  let mut person = s.retrieve_self().await.unwrap();
  person.identity.auth_id = Some("auth0|mallory".into());
  person.identity.resource_name = "admins".into();
  s.update_self(person).await.unwrap();

  let fetched = s.retrieve_self().await.unwrap();
  assert_eq!(fetched.identity.auth_id.as_deref(), Some("auth0|bob"));
  assert_eq!(fetched.identity.resource_name, PERSONS_RESOURCE_NAME);
  assert_eq!(fetched.identity.created_at, created.identity.created_at);
}

#[tokio::test]
async fn create_ignores_caller_supplied_ownership_fields() {
  let base = store().await;
  let alice = as_caller(&base, "auth0|alice");
  let bob_store = as_caller(&base, "auth0|bob");
  let alices = alice.create_self(Person { given_name: "Alice".into(), ..bob() }).await.unwrap();

  let mut person = bob();
  person.identity.resource_name = "admins".into();
  person.identity.owner_id = alices.identity.id;
  person.identity.auth_id = Some("auth0|alice".into());
  let created = bob_store.create_self(person).await.unwrap();
  assert_eq!(created.identity.resource_name, PERSONS_RESOURCE_NAME);
  assert_eq!(created.identity.owner_id, None);

  let fetched = bob_store.retrieve_self().await.unwrap();
  assert_eq!(fetched.identity.resource_name, PERSONS_RESOURCE_NAME);
  assert_eq!(fetched.identity.owner_id, None);
  assert_eq!(fetched.identity.auth_id.as_deref(), Some("auth0|bob"));
}

#[tokio::test]
async fn update_without_record_is_not_found() {
  let s = as_caller(&store().await, "auth0|bob");
  let err = s.update_self(bob()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  assert_eq!(count(&s, "users").await, 0);
}

#[tokio::test]
async fn update_of_another_callers_record_is_forbidden() {
  let base = store().await;
  let alice = as_caller(&base, "auth0|alice");
  let bob_store = as_caller(&base, "auth0|bob");

  let alice_person = Person { given_name: "Alice".into(), ..bob() };
  let alices = alice.create_self(alice_person).await.unwrap();
  bob_store.create_self(Person { addresses: Some(vec![home()]), ..bob() }).await.unwrap();

  let mut forged = bob_store.retrieve_self().await.unwrap();
  forged.identity.id = alices.identity.id;
  forged.given_name = "Mallory".into();
  forged.addresses = None;
  let err = bob_store.update_self(forged).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Forbidden);

  assert_eq!(alice.retrieve_self().await.unwrap().given_name, "Alice");
  let bobs = bob_store.retrieve_self().await.unwrap();
  assert_eq!(bobs.given_name, "Robert");
  assert_eq!(bobs.addresses().len(), 1);
}

#[tokio::test]
async fn address_writes_do_not_touch_other_callers() {
  let base = store().await;
  let alice = as_caller(&base, "auth0|alice");
  let bob_store = as_caller(&base, "auth0|bob");

  alice.create_self(Person { addresses: Some(vec![home(), vacation()]), ..bob() }).await.unwrap();
  bob_store.create_self(Person { addresses: Some(vec![home()]), ..bob() }).await.unwrap();

  let person = Person { addresses: None, ..bob_store.retrieve_self().await.unwrap() };
  bob_store.update_self(person).await.unwrap();

  assert_eq!(alice.retrieve_self().await.unwrap().addresses().len(), 2);
  assert_eq!(count(&base, "address_links").await, 2);
  assert_eq!(count(&base, "locations").await, 2);
}

// ─── Archive ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn archive_hides_record_and_is_terminal() {
  let s = as_caller(&store().await, "auth0|bob");
  s.create_self(bob()).await.unwrap();
  s.archive_self().await.unwrap();

  assert_eq!(s.retrieve_self().await.unwrap_err().kind(), ErrorKind::NotFound);
  assert_eq!(s.update_self(bob()).await.unwrap_err().kind(), ErrorKind::NotFound);
  assert_eq!(s.archive_self().await.unwrap_err().kind(), ErrorKind::NotFound);
  assert_eq!(s.create_self(bob()).await.unwrap_err().kind(), ErrorKind::Conflict);

  let (active, deleted): (bool, Option<String>) = s
    .conn
    .call(|c| {
      Ok(c.query_row("SELECT active, deleted_at FROM users", [], |r| Ok((r.get(0)?, r.get(1)?)))?)
    })
    .await
    .unwrap();
  assert!(!active);
  assert!(deleted.is_some());
}

#[tokio::test]
async fn archive_without_record_is_not_found() {
  let s = as_caller(&store().await, "auth0|bob");
  assert_eq!(s.archive_self().await.unwrap_err().kind(), ErrorKind::NotFound);
}

// ─── Atomicity ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_address_write_rolls_back_create() {
  let s = as_caller(&store().await, "auth0|bob");
  exec(
    &s,
    "CREATE TRIGGER reject_links BEFORE INSERT ON address_links
     BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
  )
  .await;

  let err = s.create_self(Person { addresses: Some(vec![home()]), ..bob() }).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Storage);
  assert!(matches!(err, Error::Storage { context: "problem creating address record", .. }));
  assert_eq!(count(&s, "users").await, 0);
  assert_eq!(count(&s, "persons").await, 0);
  assert_eq!(count(&s, "locations").await, 0);

  exec(&s, "DROP TRIGGER reject_links;").await;
  s.create_self(Person { addresses: Some(vec![home()]), ..bob() }).await.unwrap();
}

#[tokio::test]
async fn failed_address_write_rolls_back_update() {
  let s = as_caller(&store().await, "auth0|bob");
  s.create_self(Person { addresses: Some(vec![home()]), ..bob() }).await.unwrap();
  exec(
    &s,
    "CREATE TRIGGER reject_links BEFORE INSERT ON address_links
     BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
  )
  .await;

  let person = Person {
    given_name: "Bob".into(),
    addresses: Some(vec![vacation()]),
    ..s.retrieve_self().await.unwrap()
  };
  assert_eq!(s.update_self(person).await.unwrap_err().kind(), ErrorKind::Storage);

  let fetched = s.retrieve_self().await.unwrap();
  assert_eq!(fetched.given_name, "Robert");
  assert_eq!(fetched.addresses()[0].label, "Home");
  assert_eq!(count(&s, "locations").await, 1);
}

#[tokio::test]
async fn failed_orphan_prune_does_not_fail_update() {
  let s = as_caller(&store().await, "auth0|bob");
  s.create_self(Person { addresses: Some(vec![home()]), ..bob() }).await.unwrap();
  exec(
    &s,
    "CREATE TRIGGER keep_locations BEFORE DELETE ON locations
     BEGIN SELECT RAISE(ABORT, 'kept'); END;",
  )
  .await;

  let person = Person { addresses: Some(vec![vacation()]), ..s.retrieve_self().await.unwrap() };
  let updated = s.update_self(person).await.unwrap();
  assert_eq!(updated.addresses()[0].label, "Vacation");

  let fetched = s.retrieve_self().await.unwrap();
  assert_eq!(fetched.addresses().len(), 1);
  assert_eq!(fetched.addresses()[0].label, "Vacation");
  assert_eq!(count(&s, "address_links").await, 1);
  // The stale Home location stays behind.
  assert_eq!(count(&s, "locations").await, 2);
}

#[tokio::test]
async fn expired_deadline_cancels_without_writing() {
  let base = store().await;
  let ctx = RequestContext::authenticated("auth0|bob").with_deadline(Instant::now());
  let s = base.with_context(ctx);

  let err = s.create_self(bob()).await.unwrap_err();
  assert!(matches!(err, Error::Cancelled(_)));
  assert_eq!(err.kind(), ErrorKind::Storage);
  assert_eq!(count(&base, "users").await, 0);
}
