//! Generation of the human-facing student identifier.
//!
//! The matricule has the shape `STD{year}-{5 hex chars}`. With only five hex
//! characters of entropy collisions are possible, so callers must pair
//! [`generate`] with a uniqueness check inside the assigning transaction and
//! retry a bounded number of times (then fail with
//! [`crate::Error::IdentifierGeneration`]) rather than trusting randomness.

use uuid::Uuid;

/// Maximum uniqueness-check retries before the assigning transaction gives
/// up.
pub const MAX_ATTEMPTS: u32 = 8;

/// Produce one candidate matricule for the given calendar year.
pub fn generate(year: i32) -> String {
  let suffix = Uuid::new_v4().simple().to_string();
  format!("STD{year}-{}", &suffix[..5])
}

/// Whether `s` has the canonical `STD{year}-{5 hex}` shape.
pub fn is_well_formed(s: &str) -> bool {
  let Some(rest) = s.strip_prefix("STD") else {
    return false;
  };
  let Some((year, suffix)) = rest.split_once('-') else {
    return false;
  };
  year.len() == 4
    && year.chars().all(|c| c.is_ascii_digit())
    && suffix.len() == 5
    && suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
}
