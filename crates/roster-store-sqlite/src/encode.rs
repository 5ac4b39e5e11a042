//! Encoding and decoding helpers between Roster domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, UUIDs as hyphenated lowercase
//! strings, and booleans as `0`/`1`.

use chrono::{DateTime, Utc};
use roster_core::{
  identity::Identity,
  location::{Address, AddressLink, Location},
  person::Person,
  query::{Row, StatementBuilder, Value},
  table::{ADDRESS_LINKS, IDENTITY, LOCATIONS, PERSONS, Table},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// Convert a builder parameter into a value rusqlite can bind.
pub fn sql_value(v: &Value) -> rusqlite::types::Value {
  match v {
    Value::Null => rusqlite::types::Value::Null,
    Value::Integer(i) => rusqlite::types::Value::Integer(*i),
    Value::Real(r) => rusqlite::types::Value::Real(*r),
    Value::Text(t) => rusqlite::types::Value::Text(t.clone()),
  }
}

// ─── Rows written ────────────────────────────────────────────────────────────

/// Every column of the identity row.
pub fn identity_row(identity: &Identity) -> Row {
  Row::new()
    .set("id", identity.id)
    .set("pub_id", identity.pub_id.map(encode_uuid))
    .set("resource_name", identity.resource_name.as_str())
    .set("name", identity.name.as_str())
    .set("description", identity.description.as_str())
    .set("owner_id", identity.owner_id)
    .set("auth_id", identity.auth_id.clone())
    .set("legal_id", identity.legal_id.clone())
    .set("legal_id_type", identity.legal_id_type.clone())
    .set("active", identity.active)
    .set("created_at", identity.created_at.map(encode_dt))
    .set("updated_at", identity.updated_at.map(encode_dt))
    .set("deleted_at", identity.deleted_at.map(encode_dt))
}

/// The full logical row of a Person: its identity columns followed by its
/// own. Writers to the `persons` table exclude the identity-owned columns.
pub fn person_row(person: &Person) -> Row {
  let mut row = identity_row(&person.identity);
  for (column, value) in [
    ("given_name", &person.given_name),
    ("family_name", &person.family_name),
    ("email", &person.email),
    ("phone", &person.phone),
    ("backup_email", &person.backup_email),
    ("backup_phone", &person.backup_phone),
    ("avatar_url", &person.avatar_url),
  ] {
    row = row.set(column, value.as_str());
  }
  row
}

pub fn location_row(location: &Location) -> Row {
  Row::new()
    .set("address1", location.address1.as_str())
    .set("address2", location.address2.as_str())
    .set("city", location.city.as_str())
    .set("state", location.state.as_str())
    .set("zip", location.zip.as_str())
    .set("lat", location.lat)
    .set("lng", location.lng)
}

pub fn link_row(link: &AddressLink) -> Row {
  Row::new()
    .set("entity_id", link.entity_id)
    .set("location_id", link.location_id)
    .set("idx", link.idx)
    .set("label", link.label.as_str())
}

// ─── Rows read ───────────────────────────────────────────────────────────────

fn col(table: &Table, column: &str) -> String { StatementBuilder::label(table, column) }

/// Raw values read from a `persons` row joined with its `users` row.
pub struct RawPerson {
  pub id:            i64,
  pub pub_id:        String,
  pub resource_name: String,
  pub name:          String,
  pub description:   String,
  pub owner_id:      Option<i64>,
  pub auth_id:       Option<String>,
  pub legal_id:      Option<String>,
  pub legal_id_type: Option<String>,
  pub active:        bool,
  pub created_at:    String,
  pub updated_at:    String,
  pub deleted_at:    Option<String>,
  pub given_name:    String,
  pub family_name:   String,
  pub email:         String,
  pub phone:         String,
  pub backup_email:  String,
  pub backup_phone:  String,
  pub avatar_url:    String,
}

impl RawPerson {
  /// Read from a row produced by an owned `persons` select.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    let u = |c: &str| col(&IDENTITY, c);
    let p = |c: &str| col(&PERSONS, c);
    Ok(Self {
      id:            row.get(u("id").as_str())?,
      pub_id:        row.get(u("pub_id").as_str())?,
      resource_name: row.get(u("resource_name").as_str())?,
      name:          row.get(u("name").as_str())?,
      description:   row.get(u("description").as_str())?,
      owner_id:      row.get(u("owner_id").as_str())?,
      auth_id:       row.get(u("auth_id").as_str())?,
      legal_id:      row.get(u("legal_id").as_str())?,
      legal_id_type: row.get(u("legal_id_type").as_str())?,
      active:        row.get(u("active").as_str())?,
      created_at:    row.get(u("created_at").as_str())?,
      updated_at:    row.get(u("updated_at").as_str())?,
      deleted_at:    row.get(u("deleted_at").as_str())?,
      given_name:    row.get(p("given_name").as_str())?,
      family_name:   row.get(p("family_name").as_str())?,
      email:         row.get(p("email").as_str())?,
      phone:         row.get(p("phone").as_str())?,
      backup_email:  row.get(p("backup_email").as_str())?,
      backup_phone:  row.get(p("backup_phone").as_str())?,
      avatar_url:    row.get(p("avatar_url").as_str())?,
    })
  }

  /// Addresses are loaded separately; the result carries none.
  pub fn into_person(self) -> Result<Person> {
    let identity = Identity {
      id:            Some(self.id),
      pub_id:        Some(decode_uuid(&self.pub_id)?),
      resource_name: self.resource_name,
      name:          self.name,
      description:   self.description,
      owner_id:      self.owner_id,
      auth_id:       self.auth_id,
      legal_id:      self.legal_id,
      legal_id_type: self.legal_id_type,
      active:        self.active,
      created_at:    Some(decode_dt(&self.created_at)?),
      updated_at:    Some(decode_dt(&self.updated_at)?),
      deleted_at:    self.deleted_at.as_deref().map(decode_dt).transpose()?,
    };

    Ok(Person {
      given_name: self.given_name,
      family_name: self.family_name,
      email: self.email,
      phone: self.phone,
      backup_email: self.backup_email,
      backup_phone: self.backup_phone,
      avatar_url: self.avatar_url,
      ..Person::new(identity)
    })
  }
}

/// Read one address from an `address_links` select joined with `locations`.
pub fn address_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Address> {
  let l = |c: &str| col(&LOCATIONS, c);
  let a = |c: &str| col(&ADDRESS_LINKS, c);
  Ok(Address {
    location: Location {
      id:          Some(row.get(l("id").as_str())?),
      address1:    row.get(l("address1").as_str())?,
      address2:    row.get(l("address2").as_str())?,
      city:        row.get(l("city").as_str())?,
      state:       row.get(l("state").as_str())?,
      zip:         row.get(l("zip").as_str())?,
      lat:         row.get(l("lat").as_str())?,
      lng:         row.get(l("lng").as_str())?,
      change_desc: None,
    },
    idx:      row.get(a("idx").as_str())?,
    label:    row.get(a("label").as_str())?,
  })
}
