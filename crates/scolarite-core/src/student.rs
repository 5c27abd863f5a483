//! The student record — the durable identity and status row for one student.
//!
//! The `statut` field is written only through the transition table in
//! [`crate::transition`]; no other code path may set it directly. This
//! single-writer discipline is what makes the guard-and-write atomicity
//! argument in the store implementations sound.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Lifecycle status of a student record.
///
/// `Ancien` is terminal-ish: it is reachable again through the re-enrollment
/// flow, so it is not a true sink state.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StudentStatus {
  /// Self-submitted pre-registration, not yet handed to an admin.
  Brouillon,
  /// Application submitted, awaiting admin review.
  EnAttente,
  /// Application accepted; the matricule has been assigned.
  Valide,
  Rejette,
  Actif,
  Suspendu,
  Desactive,
  /// Exited active status (graduated, dropped out, transferred, excluded).
  Ancien,
  /// An alumnus has requested re-enrollment and awaits admin review.
  ReinscriptionEnAttente,
}

/// Exit motive recorded when a student is archived. Stored as free text;
/// these are the values the rest of the system keys on.
pub mod motif_sortie {
  pub const DIPLOME: &str = "diplômé";
  pub const ABANDON: &str = "abandon";
  pub const TRANSFERT: &str = "transfert";
  pub const EXCLUSION: &str = "exclusion";
}

/// The durable student record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
  pub student_id: Uuid,
  /// Human-facing identifier `STD{year}-{5 hex}`. Assigned exactly once on
  /// the first transition into `Valide`; never reassigned or cleared.
  pub matricule:  Option<String>,
  pub nom:        String,
  pub prenom:     String,
  pub email:      String,
  pub statut:     StudentStatus,

  /// Current academic linkage; mutable as the student changes track.
  pub id_departement: Option<i64>,
  pub id_parcours:    Option<i64>,

  // ── Alumni fields ─────────────────────────────────────────────────────
  pub est_ancien:     bool,
  pub annee_sortie:   Option<i32>,
  pub motif_sortie:   Option<String>,
  pub dernier_niveau: Option<String>,

  // ── Re-enrollment bookkeeping ─────────────────────────────────────────
  pub nombre_reinscriptions:       u32,
  pub date_derniere_reinscription: Option<NaiveDate>,
  /// Motive attached to a pending re-enrollment request; cleared when the
  /// request is validated.
  pub motif_reinscription:         Option<String>,

  // ── Validation bookkeeping ────────────────────────────────────────────
  pub motif_rejet:         Option<String>,
  pub date_soumission:     Option<DateTime<Utc>>,
  pub date_validation:     Option<DateTime<Utc>>,
  pub valide_par_admin_id: Option<Uuid>,

  pub date_inscription: Option<NaiveDate>,
  pub date_creation:    DateTime<Utc>,
}

impl Student {
  /// Whether the motive recorded at exit bars this student from
  /// re-enrollment.
  pub fn is_excluded(&self) -> bool {
    self.motif_sortie.as_deref() == Some(motif_sortie::EXCLUSION)
  }
}

/// Input for creating a student record (pre-inscription or direct admin
/// enrollment). Identifiers and timestamps are set by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewStudent {
  pub nom:            String,
  pub prenom:         String,
  pub email:          String,
  pub id_departement: Option<i64>,
  pub id_parcours:    Option<i64>,
}
