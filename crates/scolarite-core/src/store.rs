//! The `StudentStore` trait and supporting request/report types.
//!
//! The trait is implemented by storage backends (e.g.
//! `scolarite-store-sqlite`). Higher layers (`scolarite-api`) depend on this
//! abstraction, not on any concrete backend.
//!
//! Every mutating operation is one request-scoped transaction: the guard
//! check against the transition table and the writes it protects (status
//! update, matricule assignment, enrollment closure, history append) must be
//! atomic relative to other writers. Two concurrent validations of the same
//! `en_attente` student must not both succeed.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AcademicYear, Result,
  enrollment::{Enrollment, NewEnrollment, YearResult},
  history::HistoryEntry,
  student::{NewStudent, Student, StudentStatus},
};

// ─── Query and request types ─────────────────────────────────────────────────

/// Parameters for [`StudentStore::list_students`].
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
  pub statut: Option<StudentStatus>,
  pub skip:   u32,
  pub limit:  Option<u32>,
}

/// Parameters for [`StudentStore::list_alumni`].
#[derive(Debug, Clone, Default)]
pub struct AlumniFilter {
  pub annee_sortie:        Option<i32>,
  pub motif_sortie:        Option<String>,
  pub diplomes_uniquement: bool,
  pub skip:                u32,
  pub limit:               Option<u32>,
}

/// Parameters for [`StudentStore::search_alumni`]. Name and email match as
/// case-insensitive substrings; the matricule must match exactly.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlumniSearch {
  pub email:     Option<String>,
  /// Matched against both `nom` and `prenom`.
  pub nom:       Option<String>,
  pub matricule: Option<String>,
}

/// A filtered page of rows plus the unpaginated total.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
  pub data:  Vec<T>,
  pub count: u64,
}

/// Input to [`StudentStore::archive_student`].
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveRequest {
  /// Calendar year of exit; the archived academic year is
  /// `{annee_sortie-1}-{annee_sortie}`.
  pub annee_sortie:   i32,
  /// "diplômé", "abandon", "transfert", "exclusion", or other free text.
  pub motif_sortie:   String,
  pub dernier_niveau: Option<String>,
  #[serde(default)]
  pub est_diplome:    bool,
}

/// Input to [`StudentStore::graduate_student`].
#[derive(Debug, Clone, Deserialize)]
pub struct GraduationRequest {
  /// "Licence", "Master", etc.
  pub type_diplome: String,
  pub mention:      Option<String>,
}

/// Input to [`StudentStore::request_reenrollment`].
#[derive(Debug, Clone, Deserialize)]
pub struct ReenrollmentRequest {
  pub nouveau_parcours_id: Option<i64>,
  pub motif_reinscription: String,
}

/// Input to [`StudentStore::promote_cohort`].
#[derive(Debug, Clone)]
pub struct PromotionRequest {
  /// Target year; candidates are drawn from its predecessor.
  pub annee_academique:   AcademicYear,
  /// Level the candidates held last year, e.g. "L1".
  pub niveau_source:      String,
  /// Level they are promoted into, e.g. "L2".
  pub niveau_destination: String,
  /// Restrict candidates to `est_admis == true` (the default).
  pub admis_seulement:    bool,
}

/// One source row the promotion job could not process. The batch continues
/// past these; they are reported, not raised.
#[derive(Debug, Clone, Serialize)]
pub struct PromotionFailure {
  pub enrollment_id: i64,
  pub student_id:    Uuid,
  pub reason:        String,
}

/// Outcome of one promotion run. `created` counts rows actually inserted,
/// not candidates: already-enrolled students are skipped silently, which is
/// what makes the job safely re-runnable.
#[derive(Debug, Clone, Serialize)]
pub struct PromotionReport {
  pub annee_academique:   AcademicYear,
  pub niveau_destination: String,
  pub created:            u32,
  pub failures:           Vec<PromotionFailure>,
}

/// Aggregate counts over the alumni population.
#[derive(Debug, Clone, Serialize)]
pub struct AlumniStatistics {
  pub total_anciens:  u64,
  pub diplomes:       u64,
  pub abandons:       u64,
  pub transferts:     u64,
  pub reinscriptions: u64,
  /// Percentage of alumni who graduated, rounded to two decimals.
  pub taux_diplome:   f64,
}

impl AlumniStatistics {
  /// Graduation rate for `diplomes` out of `total`, as a percentage rounded
  /// to two decimals. Zero when there are no alumni.
  pub fn rate(diplomes: u64, total: u64) -> f64 {
    if total == 0 {
      return 0.0;
    }
    (diplomes as f64 / total as f64 * 10_000.0).round() / 100.0
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a student-records backend.
///
/// Student `statut` is mutated only through these operations, each of which
/// consults the transition table inside the same transaction that performs
/// the write. All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait StudentStore: Send + Sync {
  // ── Student records ───────────────────────────────────────────────────

  /// Create a pre-inscription draft (`brouillon`). Fails with
  /// [`crate::Error::DuplicateEmail`] if the email is taken.
  fn create_draft(
    &self,
    input: NewStudent,
  ) -> impl Future<Output = Result<Student>> + Send + '_;

  /// Direct administrative enrollment: the record is created already
  /// `valide` with its matricule assigned.
  fn create_validated(
    &self,
    input: NewStudent,
  ) -> impl Future<Output = Result<Student>> + Send + '_;

  /// Retrieve a student by UUID. Returns `None` if not found.
  fn get_student(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Student>>> + Send + '_;

  /// List students, optionally filtered by status.
  fn list_students(
    &self,
    filter: StudentFilter,
  ) -> impl Future<Output = Result<Page<Student>>> + Send + '_;

  // ── Application flow ──────────────────────────────────────────────────

  /// `brouillon -> en_attente`; records `date_soumission`.
  fn submit_application(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Student>> + Send + '_;

  /// `en_attente -> valide`; assigns the matricule if absent and records
  /// the validating admin and dates.
  fn validate_application(
    &self,
    id: Uuid,
    admin_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Student>> + Send + '_;

  /// `en_attente -> rejette`; stores the rejection motive.
  fn reject_application(
    &self,
    id: Uuid,
    motif: String,
  ) -> impl Future<Output = Result<Student>> + Send + '_;

  /// `{valide, desactive} -> actif`.
  fn activate(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Student>> + Send + '_;

  /// `actif -> desactive`.
  fn deactivate(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Student>> + Send + '_;

  // ── Exit flow ─────────────────────────────────────────────────────────

  /// `{actif, suspendu} -> ancien`: appends the exit event to the history
  /// archive, sets the alumni fields, and — when the motive is a graduation
  /// — closes the latest open enrollment as `validée`/admitted. One
  /// transaction.
  fn archive_student(
    &self,
    id: Uuid,
    request: ArchiveRequest,
  ) -> impl Future<Output = Result<Student>> + Send + '_;

  /// Graduation shorthand: `actif -> ancien` with `est_diplome = true`,
  /// diploma type and mention recorded in the history row.
  fn graduate_student(
    &self,
    id: Uuid,
    request: GraduationRequest,
  ) -> impl Future<Output = Result<Student>> + Send + '_;

  // ── Re-enrollment flow ────────────────────────────────────────────────

  /// `ancien -> reinscription_en_attente`. Guards: the student must be an
  /// alumnus, must not have exited by exclusion, and must not already have
  /// a pending request.
  fn request_reenrollment(
    &self,
    id: Uuid,
    request: ReenrollmentRequest,
  ) -> impl Future<Output = Result<Student>> + Send + '_;

  /// `reinscription_en_attente -> valide`: increments the re-enrollment
  /// counter, appends a "réinscription_validée" history row, and clears the
  /// pending motive.
  fn validate_reenrollment(
    &self,
    id: Uuid,
    admin_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Student>> + Send + '_;

  // ── Enrollment ledger ─────────────────────────────────────────────────

  /// Insert an `en_cours` enrollment for a new academic year. Fails with
  /// [`crate::Error::DuplicateEnrollment`] if the `(student, year)` pair
  /// exists — the existing row is never overwritten or merged. The student
  /// must be `actif`.
  fn create_enrollment(
    &self,
    input: NewEnrollment,
  ) -> impl Future<Output = Result<Enrollment>> + Send + '_;

  /// Enter year-end results, closing the enrollment exactly once. Fails
  /// with [`crate::Error::AlreadyClosed`] if it is not `en_cours`.
  fn close_enrollment(
    &self,
    enrollment_id: i64,
    result: YearResult,
  ) -> impl Future<Output = Result<Enrollment>> + Send + '_;

  /// All enrollments for a student, ordered by academic year descending.
  fn enrollments_for_student(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Vec<Enrollment>>> + Send + '_;

  /// The most recently created enrollment (by `date_inscription`
  /// descending), or `None`.
  fn latest_enrollment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Enrollment>>> + Send + '_;

  // ── History archive ───────────────────────────────────────────────────

  /// All archived lifecycle events for a student, ordered by `date_debut`
  /// descending. Reads only — there is no public mutation surface.
  fn history_for_student(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Vec<HistoryEntry>>> + Send + '_;

  // ── Cohort promotion ──────────────────────────────────────────────────

  /// Bulk year-to-year promotion. Candidates are the previous year's
  /// enrollments at `niveau_source` (admitted only, unless disabled);
  /// students already enrolled for the target year are skipped without
  /// error; malformed source rows are skipped and reported in the result.
  /// The whole batch is one transaction.
  fn promote_cohort(
    &self,
    request: PromotionRequest,
  ) -> impl Future<Output = Result<PromotionReport>> + Send + '_;

  // ── Alumni ────────────────────────────────────────────────────────────

  /// Filterable, paginated list of alumni.
  fn list_alumni(
    &self,
    filter: AlumniFilter,
  ) -> impl Future<Output = Result<Page<Student>>> + Send + '_;

  /// Look up alumni by email, name, or matricule. Returns at most 50 rows.
  fn search_alumni(
    &self,
    query: AlumniSearch,
  ) -> impl Future<Output = Result<Vec<Student>>> + Send + '_;

  /// Aggregate alumni counts and graduation rate.
  fn alumni_statistics(
    &self,
  ) -> impl Future<Output = Result<AlumniStatistics>> + Send + '_;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn graduation_rate_rounds_to_two_decimals() {
    assert_eq!(AlumniStatistics::rate(0, 0), 0.0);
    assert_eq!(AlumniStatistics::rate(1, 3), 33.33);
    assert_eq!(AlumniStatistics::rate(2, 3), 66.67);
    assert_eq!(AlumniStatistics::rate(3, 3), 100.0);
  }
}
