//! Error types for `scolarite-core`.
//!
//! Every rejection names the current status and the attempted action so a
//! caller can distinguish "already done" from "never allowed". None of these
//! errors is ever retried automatically by this crate.

use thiserror::Error;
use uuid::Uuid;

use crate::student::StudentStatus;

#[derive(Debug, Error)]
pub enum Error {
  #[error("student not found: {0}")]
  StudentNotFound(Uuid),

  #[error("enrollment not found: {0}")]
  EnrollmentNotFound(i64),

  #[error("illegal status transition: {from} -> {to}")]
  InvalidTransition {
    from: StudentStatus,
    to:   StudentStatus,
  },

  /// The requested action requires an active student.
  #[error("student {student_id} is not active (current status: {statut})")]
  NotActive {
    student_id: Uuid,
    statut:     StudentStatus,
  },

  #[error("student {student_id} is already enrolled for {annee_academique}")]
  DuplicateEnrollment {
    student_id:       Uuid,
    annee_academique: String,
  },

  #[error("enrollment {enrollment_id} is already closed (status: {statut})")]
  AlreadyClosed {
    enrollment_id: i64,
    statut:        String,
  },

  #[error("could not generate a unique student identifier after {attempts} attempts")]
  IdentifierGeneration { attempts: u32 },

  #[error("invalid academic year {0:?}: expected \"YYYY-YYYY\" with contiguous years")]
  InvalidAcademicYear(String),

  #[error("student {0} is not an alumnus")]
  NotAlumni(Uuid),

  #[error("student {0} was excluded and may not re-enroll")]
  ReenrollmentExcluded(Uuid),

  #[error("a re-enrollment request is already pending for student {0}")]
  ReenrollmentPending(Uuid),

  #[error("a student with email {0:?} already exists")]
  DuplicateEmail(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// Infrastructure failure in the backing store. Mapped to 500 at the HTTP
  /// boundary; the enclosing transaction has been rolled back in full.
  #[error("storage error: {0}")]
  Storage(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
