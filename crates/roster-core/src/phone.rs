//! Phone number presentation.
//!
//! Phones are stored as bare digit strings. Hyphenation happens only on the
//! way out, and only for exactly ten bare digits, so formatting an already
//! formatted value is a no-op. Input may contain only digits and common
//! separators; anything else (an extension, a letter) is rejected rather than
//! folded into the stored digits.

use std::sync::LazyLock;

use regex::Regex;

use crate::{Error, Result};

static PHONE_OUT: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(\d{3})(\d{3})(\d{4})$").expect("phone pattern is valid")
});

/// Rewrite `5555555555` as `555-555-5555`. Anything else is returned as-is.
pub fn format_out(phone: &str) -> String {
  PHONE_OUT.replace(phone, "$1-$2-$3").into_owned()
}

const SEPARATORS: &[char] = &[' ', '-', '.', '(', ')', '+'];

/// Reduce a phone to the digits that get persisted.
pub fn bare(phone: &str) -> Result<String> {
  if let Some(c) = phone.chars().find(|c| !c.is_ascii_digit() && !SEPARATORS.contains(c)) {
    return Err(Error::Validation(format!("unexpected {c:?} in phone number {phone:?}")));
  }
  Ok(digits(phone))
}

/// The digits of `phone`, ignoring everything else.
pub fn digits(phone: &str) -> String {
  phone.chars().filter(char::is_ascii_digit).collect()
}
