//! The append-only archive of lifecycle-closing events.
//!
//! One row per exit or re-enrollment event. Rows are never updated or
//! deleted after insertion — the store exposes no mutation API for them.
//! This is the institutional record of truth for "what happened and when".

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AcademicYear;

/// Outcome labels recorded in history rows. Free text in the schema; these
/// are the values the service itself writes.
pub mod statut {
  pub const DIPLOME: &str = "diplômé";
  pub const REINSCRIPTION_VALIDEE: &str = "réinscription_validée";
}

/// One archived lifecycle event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
  pub history_id:       i64,
  pub student_id:       Uuid,
  pub annee_academique: AcademicYear,
  pub date_debut:       NaiveDate,
  /// `None` while the recorded period is still open (re-enrollment rows).
  pub date_fin:         Option<NaiveDate>,
  /// Outcome label, e.g. "diplômé", "abandon", "réinscription_validée".
  pub statut:           String,
  pub niveau:           Option<String>,
  pub id_departement:   Option<i64>,
  pub id_parcours:      Option<i64>,
  pub est_diplome:      bool,
  pub motif_fin:        Option<String>,
  pub notes:            Option<String>,
  pub date_creation:    DateTime<Utc>,
}

/// Input for a history append. `date_creation` is set by the store.
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
  pub student_id:       Uuid,
  pub annee_academique: AcademicYear,
  pub date_debut:       NaiveDate,
  pub date_fin:         Option<NaiveDate>,
  pub statut:           String,
  pub niveau:           Option<String>,
  pub id_departement:   Option<i64>,
  pub id_parcours:      Option<i64>,
  pub est_diplome:      bool,
  pub motif_fin:        Option<String>,
  pub notes:            Option<String>,
}
