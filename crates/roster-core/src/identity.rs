//! The identity sub-aggregate embedded in every Person.
//!
//! An identity owns the base fields shared by all user-like records: internal
//! and public ids, display name, ownership, the authenticated identity it
//! belongs to, and the lifecycle timestamps. Person-specific storage never
//! writes these columns; it delegates to the identity's own operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Store-assigned integer key of an identity row.
pub type InternalId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
  /// Assigned by the store on create. Serialized so a caller can echo it
  /// back on update, but only [`Identity::pub_id`] is a stable public handle.
  #[serde(default)]
  pub id:            Option<InternalId>,
  /// Assigned by the store on create.
  #[serde(default)]
  pub pub_id:        Option<Uuid>,
  #[serde(default)]
  pub resource_name: String,
  #[serde(default)]
  pub name:          String,
  #[serde(default)]
  pub description:   String,
  /// The identity that owns this record, if any.
  #[serde(default)]
  pub owner_id:      Option<InternalId>,
  /// Opaque id from the authentication provider.
  #[serde(default)]
  pub auth_id:       Option<String>,
  #[serde(default)]
  pub legal_id:      Option<String>,
  #[serde(default)]
  pub legal_id_type: Option<String>,
  #[serde(default)]
  pub active:        bool,
  #[serde(default)]
  pub created_at:    Option<DateTime<Utc>>,
  #[serde(default)]
  pub updated_at:    Option<DateTime<Utc>>,
  /// Soft-delete marker; archived identities are hidden from normal reads.
  #[serde(default)]
  pub deleted_at:    Option<DateTime<Utc>>,
}

impl Identity {
  /// A not-yet-persisted identity; ids and timestamps are left for the store.
  pub fn new(
    resource_name: impl Into<String>,
    name: impl Into<String>,
    description: impl Into<String>,
    active: bool,
  ) -> Self {
    Self {
      id: None,
      pub_id: None,
      resource_name: resource_name.into(),
      name: name.into(),
      description: description.into(),
      owner_id: None,
      auth_id: None,
      legal_id: None,
      legal_id_type: None,
      active,
      created_at: None,
      updated_at: None,
      deleted_at: None,
    }
  }

  /// Clear every store-assigned field, leaving only caller-supplied data.
  pub fn without_system_fields(&self) -> Self {
    Self {
      id: None,
      pub_id: None,
      created_at: None,
      updated_at: None,
      deleted_at: None,
      ..self.clone()
    }
  }
}
