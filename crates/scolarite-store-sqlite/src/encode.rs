//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as
//! `YYYY-MM-DD`, UUIDs as hyphenated lowercase strings, and the status enums
//! as their strum string forms.

use std::str::FromStr as _;

use chrono::{DateTime, NaiveDate, Utc};
use scolarite_core::{
  Error, Result,
  enrollment::{Enrollment, EnrollmentStatus},
  history::HistoryEntry,
  student::{Student, StudentStatus},
};
use uuid::Uuid;

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> {
  Uuid::parse_str(s).map_err(|e| Error::Storage(format!("bad uuid {s:?}: {e}")))
}

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Storage(format!("bad timestamp {s:?}: {e}")))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Storage(format!("bad date {s:?}: {e}")))
}

pub fn decode_student_status(s: &str) -> Result<StudentStatus> {
  StudentStatus::from_str(s)
    .map_err(|_| Error::Storage(format!("unknown student status: {s:?}")))
}

pub fn decode_enrollment_status(s: &str) -> Result<EnrollmentStatus> {
  EnrollmentStatus::from_str(s)
    .map_err(|_| Error::Storage(format!("unknown enrollment status: {s:?}")))
}

// ─── Students ────────────────────────────────────────────────────────────────

/// Column list shared by every `students` SELECT; order matches
/// [`RawStudent::from_row`].
pub const STUDENT_COLUMNS: &str = "student_id, matricule, nom, prenom, email, \
   statut, id_departement, id_parcours, est_ancien, annee_sortie, \
   motif_sortie, dernier_niveau, nombre_reinscriptions, \
   date_derniere_reinscription, motif_reinscription, motif_rejet, \
   date_soumission, date_validation, valide_par_admin_id, date_inscription, \
   date_creation";

/// Raw strings read directly from a `students` row.
pub struct RawStudent {
  pub student_id:                  String,
  pub matricule:                   Option<String>,
  pub nom:                         String,
  pub prenom:                      String,
  pub email:                       String,
  pub statut:                      String,
  pub id_departement:              Option<i64>,
  pub id_parcours:                 Option<i64>,
  pub est_ancien:                  bool,
  pub annee_sortie:                Option<i32>,
  pub motif_sortie:                Option<String>,
  pub dernier_niveau:              Option<String>,
  pub nombre_reinscriptions:       i64,
  pub date_derniere_reinscription: Option<String>,
  pub motif_reinscription:         Option<String>,
  pub motif_rejet:                 Option<String>,
  pub date_soumission:             Option<String>,
  pub date_validation:             Option<String>,
  pub valide_par_admin_id:         Option<String>,
  pub date_inscription:            Option<String>,
  pub date_creation:               String,
}

impl RawStudent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      student_id:                  row.get(0)?,
      matricule:                   row.get(1)?,
      nom:                         row.get(2)?,
      prenom:                      row.get(3)?,
      email:                       row.get(4)?,
      statut:                      row.get(5)?,
      id_departement:              row.get(6)?,
      id_parcours:                 row.get(7)?,
      est_ancien:                  row.get(8)?,
      annee_sortie:                row.get(9)?,
      motif_sortie:                row.get(10)?,
      dernier_niveau:              row.get(11)?,
      nombre_reinscriptions:       row.get(12)?,
      date_derniere_reinscription: row.get(13)?,
      motif_reinscription:         row.get(14)?,
      motif_rejet:                 row.get(15)?,
      date_soumission:             row.get(16)?,
      date_validation:             row.get(17)?,
      valide_par_admin_id:         row.get(18)?,
      date_inscription:            row.get(19)?,
      date_creation:               row.get(20)?,
    })
  }

  pub fn into_student(self) -> Result<Student> {
    Ok(Student {
      student_id: decode_uuid(&self.student_id)?,
      matricule: self.matricule,
      nom: self.nom,
      prenom: self.prenom,
      email: self.email,
      statut: decode_student_status(&self.statut)?,
      id_departement: self.id_departement,
      id_parcours: self.id_parcours,
      est_ancien: self.est_ancien,
      annee_sortie: self.annee_sortie,
      motif_sortie: self.motif_sortie,
      dernier_niveau: self.dernier_niveau,
      nombre_reinscriptions: self.nombre_reinscriptions as u32,
      date_derniere_reinscription: self
        .date_derniere_reinscription
        .as_deref()
        .map(decode_date)
        .transpose()?,
      motif_reinscription: self.motif_reinscription,
      motif_rejet: self.motif_rejet,
      date_soumission: self.date_soumission.as_deref().map(decode_dt).transpose()?,
      date_validation: self.date_validation.as_deref().map(decode_dt).transpose()?,
      valide_par_admin_id: self
        .valide_par_admin_id
        .as_deref()
        .map(decode_uuid)
        .transpose()?,
      date_inscription: self
        .date_inscription
        .as_deref()
        .map(decode_date)
        .transpose()?,
      date_creation: decode_dt(&self.date_creation)?,
    })
  }
}

// ─── Enrollments ─────────────────────────────────────────────────────────────

/// Column list shared by every `inscriptions` SELECT; order matches
/// [`RawEnrollment::from_row`].
pub const ENROLLMENT_COLUMNS: &str = "enrollment_id, student_id, \
   annee_academique, niveau, id_departement, id_parcours, date_inscription, \
   date_validation, statut, moyenne_annuelle, credits_obtenus, est_admis";

/// Raw strings read directly from an `inscriptions` row.
pub struct RawEnrollment {
  pub enrollment_id:    i64,
  pub student_id:       String,
  pub annee_academique: String,
  pub niveau:           String,
  pub id_departement:   Option<i64>,
  pub id_parcours:      Option<i64>,
  pub date_inscription: String,
  pub date_validation:  Option<String>,
  pub statut:           String,
  pub moyenne_annuelle: Option<f64>,
  pub credits_obtenus:  i64,
  pub est_admis:        Option<bool>,
}

impl RawEnrollment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      enrollment_id:    row.get(0)?,
      student_id:       row.get(1)?,
      annee_academique: row.get(2)?,
      niveau:           row.get(3)?,
      id_departement:   row.get(4)?,
      id_parcours:      row.get(5)?,
      date_inscription: row.get(6)?,
      date_validation:  row.get(7)?,
      statut:           row.get(8)?,
      moyenne_annuelle: row.get(9)?,
      credits_obtenus:  row.get(10)?,
      est_admis:        row.get(11)?,
    })
  }

  pub fn into_enrollment(self) -> Result<Enrollment> {
    Ok(Enrollment {
      enrollment_id: self.enrollment_id,
      student_id: decode_uuid(&self.student_id)?,
      annee_academique: self.annee_academique.parse()?,
      niveau: self.niveau,
      id_departement: self.id_departement,
      id_parcours: self.id_parcours,
      date_inscription: decode_date(&self.date_inscription)?,
      date_validation: self.date_validation.as_deref().map(decode_dt).transpose()?,
      statut: decode_enrollment_status(&self.statut)?,
      moyenne_annuelle: self.moyenne_annuelle,
      credits_obtenus: self.credits_obtenus as u32,
      est_admis: self.est_admis,
    })
  }
}

// ─── History ─────────────────────────────────────────────────────────────────

/// Column list shared by every `historique_etudiants` SELECT; order matches
/// [`RawHistoryEntry::from_row`].
pub const HISTORY_COLUMNS: &str = "history_id, student_id, annee_academique, \
   date_debut, date_fin, statut, niveau, id_departement, id_parcours, \
   est_diplome, motif_fin, notes, date_creation";

/// Raw strings read directly from a `historique_etudiants` row.
pub struct RawHistoryEntry {
  pub history_id:       i64,
  pub student_id:       String,
  pub annee_academique: String,
  pub date_debut:       String,
  pub date_fin:         Option<String>,
  pub statut:           String,
  pub niveau:           Option<String>,
  pub id_departement:   Option<i64>,
  pub id_parcours:      Option<i64>,
  pub est_diplome:      bool,
  pub motif_fin:        Option<String>,
  pub notes:            Option<String>,
  pub date_creation:    String,
}

impl RawHistoryEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      history_id:       row.get(0)?,
      student_id:       row.get(1)?,
      annee_academique: row.get(2)?,
      date_debut:       row.get(3)?,
      date_fin:         row.get(4)?,
      statut:           row.get(5)?,
      niveau:           row.get(6)?,
      id_departement:   row.get(7)?,
      id_parcours:      row.get(8)?,
      est_diplome:      row.get(9)?,
      motif_fin:        row.get(10)?,
      notes:            row.get(11)?,
      date_creation:    row.get(12)?,
    })
  }

  pub fn into_entry(self) -> Result<HistoryEntry> {
    Ok(HistoryEntry {
      history_id: self.history_id,
      student_id: decode_uuid(&self.student_id)?,
      annee_academique: self.annee_academique.parse()?,
      date_debut: decode_date(&self.date_debut)?,
      date_fin: self.date_fin.as_deref().map(decode_date).transpose()?,
      statut: self.statut,
      niveau: self.niveau,
      id_departement: self.id_departement,
      id_parcours: self.id_parcours,
      est_diplome: self.est_diplome,
      motif_fin: self.motif_fin,
      notes: self.notes,
      date_creation: decode_dt(&self.date_creation)?,
    })
  }
}
