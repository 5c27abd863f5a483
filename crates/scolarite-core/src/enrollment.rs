//! Per-academic-year enrollment rows.
//!
//! A student has at most one enrollment per academic year; the pair
//! `(student_id, annee_academique)` is unique. Rows are closed exactly once
//! by year-end result entry and never deleted by normal flow.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::AcademicYear;

/// Outcome state of one enrollment year.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
pub enum EnrollmentStatus {
  #[serde(rename = "en_cours")]
  #[strum(serialize = "en_cours")]
  EnCours,
  #[serde(rename = "validée")]
  #[strum(serialize = "validée")]
  Validee,
  #[serde(rename = "échouée")]
  #[strum(serialize = "échouée")]
  Echouee,
  #[serde(rename = "abandonnée")]
  #[strum(serialize = "abandonnée")]
  Abandonnee,
}

impl EnrollmentStatus {
  pub fn is_open(&self) -> bool { matches!(self, Self::EnCours) }
}

/// One academic-year enrollment. Department and program are a snapshot for
/// that year and may differ from the student's current values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
  pub enrollment_id:    i64,
  pub student_id:       Uuid,
  pub annee_academique: AcademicYear,
  /// Level label for the year, e.g. "L1", "M2".
  pub niveau:           String,
  pub id_departement:   Option<i64>,
  pub id_parcours:      Option<i64>,
  pub date_inscription: NaiveDate,
  /// Set when the year is closed with results.
  pub date_validation:  Option<DateTime<Utc>>,
  pub statut:           EnrollmentStatus,
  pub moyenne_annuelle: Option<f64>,
  pub credits_obtenus:  u32,
  /// Unset while the year is `en_cours`; set exactly once at closure.
  pub est_admis:        Option<bool>,
}

/// Input to `create_enrollment`. The row starts `en_cours` with
/// `date_inscription` set by the store.
#[derive(Debug, Clone)]
pub struct NewEnrollment {
  pub student_id:       Uuid,
  pub annee_academique: AcademicYear,
  pub niveau:           String,
  pub id_departement:   Option<i64>,
  pub id_parcours:      Option<i64>,
}

/// Year-end results entered when closing an enrollment.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct YearResult {
  pub est_admis:        bool,
  pub moyenne_annuelle: Option<f64>,
  #[serde(default)]
  pub credits_obtenus:  u32,
}

impl YearResult {
  /// The closed status this result maps to.
  pub fn closed_status(&self) -> EnrollmentStatus {
    if self.est_admis {
      EnrollmentStatus::Validee
    } else {
      EnrollmentStatus::Echouee
    }
  }
}
