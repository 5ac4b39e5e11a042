//! Postal locations and the address links that attach them to a Person.

use serde::{Deserialize, Serialize};

use crate::identity::InternalId;

/// First sequence index assigned to a Person's addresses.
pub const FIRST_ADDRESS_INDEX: i64 = 1;

/// A normalised postal location. Location rows are shared storage; a Person
/// reaches them only through its address links.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
  #[serde(default)]
  pub id:          Option<InternalId>,
  #[serde(default)]
  pub address1:    String,
  #[serde(default)]
  pub address2:    String,
  #[serde(default)]
  pub city:        String,
  /// State, province, or region.
  #[serde(default)]
  pub state:       String,
  #[serde(default)]
  pub zip:         String,
  #[serde(default)]
  pub lat:         Option<f64>,
  #[serde(default)]
  pub lng:         Option<f64>,
  /// Transient, human-readable change notes. Never persisted.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub change_desc: Option<Vec<String>>,
}

impl Location {
  /// True when both locations describe the same place, ignoring the row id
  /// and any transient change notes.
  pub fn same_place(&self, other: &Self) -> bool {
    self.address1 == other.address1
      && self.address2 == other.address2
      && self.city == other.city
      && self.state == other.state
      && self.zip == other.zip
      && self.lat == other.lat
      && self.lng == other.lng
  }
}

/// A location as seen from its owning Person: the location itself plus the
/// link record's sequence index and label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
  #[serde(flatten)]
  pub location: Location,
  /// 1-based position within the owner's address list; assigned on write.
  #[serde(default)]
  pub idx:      i64,
  /// Free-text label such as "Home".
  #[serde(default)]
  pub label:    String,
}

impl Address {
  pub fn new(location: Location, label: impl Into<String>) -> Self {
    Self { location, idx: 0, label: label.into() }
  }

  /// True when the two addresses are observably the same entry: same place,
  /// same label, same position.
  pub fn same_entry(&self, other: &Self) -> bool {
    self.idx == other.idx
      && self.label == other.label
      && self.location.same_place(&other.location)
  }
}

/// The persisted link between an owning entity and a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressLink {
  pub entity_id:   InternalId,
  pub location_id: InternalId,
  pub idx:         i64,
  pub label:       String,
}
