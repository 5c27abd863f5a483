//! The `"YYYY-YYYY"` academic-year value type.
//!
//! The institution stores academic years as plain strings and computes the
//! previous year by decrementing both components. That string arithmetic is
//! contained here behind explicit parse/format so nothing else in the system
//! touches it directly.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{Error, Result};

/// One school year, e.g. `"2024-2025"`. The two components are always
/// contiguous; parsing anything else fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AcademicYear {
  start: i32,
}

impl AcademicYear {
  /// The year starting in September of `start` (e.g. `starting(2024)` is
  /// `"2024-2025"`).
  pub fn starting(start: i32) -> Self { Self { start } }

  /// The year ending in `end` (e.g. `ending(2025)` is `"2024-2025"`).
  pub fn ending(end: i32) -> Self { Self { start: end - 1 } }

  /// Like [`Self::ending`], but for caller-supplied years: both components
  /// must stay four digits, matching what [`FromStr`] accepts. Rejects
  /// anything else instead of wrapping.
  pub fn try_ending(end: i32) -> Result<Self> {
    end
      .checked_sub(1)
      .filter(|start| (1000..=9998).contains(start))
      .map(|start| Self { start })
      .ok_or_else(|| Error::InvalidAcademicYear(end.to_string()))
  }

  pub fn start(&self) -> i32 { self.start }

  pub fn end(&self) -> i32 { self.start + 1 }

  /// The preceding academic year. Pure integer decrement, not a calendar
  /// lookup.
  pub fn previous(&self) -> Self {
    Self {
      start: self.start - 1,
    }
  }
}

impl fmt::Display for AcademicYear {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}", self.start, self.start + 1)
  }
}

impl FromStr for AcademicYear {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let invalid = || Error::InvalidAcademicYear(s.to_string());

    let (first, second) = s.split_once('-').ok_or_else(invalid)?;
    let start: i32 = first.parse().map_err(|_| invalid())?;
    let end: i32 = second.parse().map_err(|_| invalid())?;

    if first.len() != 4 || second.len() != 4 || end != start + 1 {
      return Err(invalid());
    }

    Ok(Self { start })
  }
}

impl Serialize for AcademicYear {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for AcademicYear {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(de::Error::custom)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_conventional_format() {
    let year: AcademicYear = "2024-2025".parse().unwrap();
    assert_eq!(year.start(), 2024);
    assert_eq!(year.end(), 2025);
    assert_eq!(year.to_string(), "2024-2025");
  }

  #[test]
  fn previous_decrements_both_components() {
    let year: AcademicYear = "2024-2025".parse().unwrap();
    assert_eq!(year.previous().to_string(), "2023-2024");
  }

  #[test]
  fn rejects_non_contiguous_years() {
    assert!("2024-2026".parse::<AcademicYear>().is_err());
    assert!("2024-2024".parse::<AcademicYear>().is_err());
  }

  #[test]
  fn rejects_malformed_strings() {
    for s in ["", "2024", "2024/2025", "24-25", "abcd-efgh", "2024-2025-2026"] {
      assert!(
        s.parse::<AcademicYear>().is_err(),
        "expected parse failure for {s:?}"
      );
    }
  }

  #[test]
  fn constructors_agree() {
    assert_eq!(AcademicYear::starting(2024), AcademicYear::ending(2025));
  }

  #[test]
  fn try_ending_bounds_the_exit_year() {
    assert_eq!(
      AcademicYear::try_ending(2025).unwrap(),
      AcademicYear::ending(2025)
    );
    for end in [i32::MIN, -1, 0, 1000, 10_000, i32::MAX] {
      assert!(
        AcademicYear::try_ending(end).is_err(),
        "expected rejection for {end}"
      );
    }
  }
}
