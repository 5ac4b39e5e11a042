//! Logical table descriptors for the Person aggregate.
//!
//! These describe the persisted shape (names, aliases, columns) without
//! committing to a driver; backends create the physical tables and feed these
//! descriptors to [`crate::query::StatementBuilder`].

/// A table as seen by the statement builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Table {
  pub name:         &'static str,
  pub alias:        &'static str,
  pub columns:      &'static [&'static str],
  /// The column holding the owning identity's internal id, if rows of this
  /// table belong to an identity.
  pub identity_key: Option<&'static str>,
}

impl Table {
  pub fn is_identity(&self) -> bool { self.name == IDENTITY.name }
}

/// Column on the identity table holding the caller's authentication id.
pub const AUTH_ID_COLUMN: &str = "auth_id";

/// Column on the identity table marking a soft-deleted row.
pub const SOFT_DELETE_COLUMN: &str = "deleted_at";

/// Base identity rows; owned by the identity sub-aggregate.
pub const IDENTITY: Table = Table {
  name:         "users",
  alias:        "user",
  columns:      &[
    "id",
    "pub_id",
    "resource_name",
    "name",
    "description",
    "owner_id",
    "auth_id",
    "legal_id",
    "legal_id_type",
    "active",
    "created_at",
    "updated_at",
    "deleted_at",
  ],
  identity_key: Some("id"),
};

/// Person-specific rows, keyed by the identity's internal id.
pub const PERSONS: Table = Table {
  name:         "persons",
  alias:        "person",
  columns:      &[
    "id",
    "given_name",
    "family_name",
    "email",
    "phone",
    "backup_email",
    "backup_phone",
    "avatar_url",
  ],
  identity_key: Some("id"),
};

/// Shared postal locations.
pub const LOCATIONS: Table = Table {
  name:         "locations",
  alias:        "location",
  columns:      &["id", "address1", "address2", "city", "state", "zip", "lat", "lng"],
  identity_key: None,
};

/// Links from an owning entity to a location, ordered by `idx`.
pub const ADDRESS_LINKS: Table = Table {
  name:         "address_links",
  alias:        "address",
  columns:      &["entity_id", "location_id", "idx", "label"],
  identity_key: Some("entity_id"),
};
