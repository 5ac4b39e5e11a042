//! The Person aggregate: an identity, person-specific contact fields, and an
//! ordered list of addresses.

use serde::{Deserialize, Serialize};

use crate::{Result, identity::Identity, location::Address, phone};

/// Resource name recorded on every Person identity.
pub const PERSONS_RESOURCE_NAME: &str = "persons";

/// A self-service user profile.
///
/// `addresses` is `None` when the Person has no addresses. A loaded Person
/// never carries `Some(vec![])`; see [`Person::normalize_addresses`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
  #[serde(flatten)]
  pub identity:     Identity,
  #[serde(default)]
  pub given_name:   String,
  #[serde(default)]
  pub family_name:  String,
  #[serde(default)]
  pub email:        String,
  #[serde(default)]
  pub phone:        String,
  #[serde(default)]
  pub backup_email: String,
  #[serde(default)]
  pub backup_phone: String,
  #[serde(default)]
  pub avatar_url:   String,
  #[serde(default)]
  pub addresses:    Option<Vec<Address>>,
  /// Human-readable diffs accumulated during mutation. Never persisted.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub change_desc:  Option<Vec<String>>,
}

impl Person {
  /// A Person with the given identity and every other field empty.
  pub fn new(identity: Identity) -> Self {
    Self {
      identity,
      given_name: String::new(),
      family_name: String::new(),
      email: String::new(),
      phone: String::new(),
      backup_email: String::new(),
      backup_phone: String::new(),
      avatar_url: String::new(),
      addresses: None,
      change_desc: None,
    }
  }

  pub fn addresses(&self) -> &[Address] { self.addresses.as_deref().unwrap_or(&[]) }

  /// Collapse a present-but-empty address list into `None`.
  pub fn normalize_addresses(&mut self) {
    if self.addresses.as_ref().is_some_and(Vec::is_empty) {
      self.addresses = None;
    }
  }

  /// Hyphenate both phone fields for presentation.
  pub fn format_out(mut self) -> Self {
    self.phone = phone::format_out(&self.phone);
    self.backup_phone = phone::format_out(&self.backup_phone);
    self
  }

  /// Strip both phone fields down to the digits that get persisted. Fails,
  /// leaving both fields untouched, if either holds more than a number.
  pub fn normalize_phones(&mut self) -> Result<()> {
    let phone = phone::bare(&self.phone)?;
    let backup_phone = phone::bare(&self.backup_phone)?;
    self.phone = phone;
    self.backup_phone = backup_phone;
    Ok(())
  }

  /// Move every address's change notes onto the Person's own list.
  pub fn promote_changes(&mut self) {
    let Some(addresses) = self.addresses.as_mut() else { return };
    for address in addresses {
      if let Some(notes) = address.location.change_desc.take() {
        self.change_desc.get_or_insert_with(Vec::new).extend(notes);
      }
    }
  }

  /// Field-by-field comparison of everything a caller supplies, ignoring
  /// store-assigned ids and timestamps, phone presentation, and transient
  /// change notes.
  pub fn same_profile(&self, other: &Self) -> bool {
    self.identity.without_system_fields() == other.identity.without_system_fields()
      && self.given_name == other.given_name
      && self.family_name == other.family_name
      && self.email == other.email
      && phone::digits(&self.phone) == phone::digits(&other.phone)
      && self.backup_email == other.backup_email
      && phone::digits(&self.backup_phone) == phone::digits(&other.backup_phone)
      && self.avatar_url == other.avatar_url
      && self.addresses().len() == other.addresses().len()
      && self
        .addresses()
        .iter()
        .zip(other.addresses())
        .all(|(a, b)| a.label == b.label && a.location.same_place(&b.location))
  }
}
