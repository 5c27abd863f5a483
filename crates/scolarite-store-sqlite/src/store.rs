//! [`SqliteStore`] — the SQLite implementation of
//! [`StudentStore`](scolarite_core::store::StudentStore).
//!
//! Every mutating operation runs as one rusqlite transaction on a single
//! serialized connection: the status guard is re-read inside the same
//! transaction that performs the write, so two concurrent validations of the
//! same student cannot both pass the guard. A failed operation rolls the
//! whole transaction back; no partial writes escape.

use std::path::Path;

use chrono::{DateTime, Datelike as _, NaiveDate, Utc};
use rusqlite::{OptionalExtension as _, params};
use uuid::Uuid;

use scolarite_core::{
  AcademicYear, Error, Result,
  enrollment::{Enrollment, EnrollmentStatus, NewEnrollment, YearResult},
  history::{self, HistoryEntry, NewHistoryEntry},
  matricule,
  store::{
    AlumniFilter, AlumniSearch, AlumniStatistics, ArchiveRequest,
    GraduationRequest, Page, PromotionFailure, PromotionReport,
    PromotionRequest, ReenrollmentRequest, StudentFilter, StudentStore,
  },
  student::{NewStudent, Student, StudentStatus, motif_sortie},
  transition,
};

use crate::{
  encode::{
    ENROLLMENT_COLUMNS, HISTORY_COLUMNS, RawEnrollment, RawHistoryEntry,
    RawStudent, STUDENT_COLUMNS, encode_date, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

/// Collapse an infrastructure error into [`Error::Storage`].
fn storage<E: std::fmt::Display>(e: E) -> Error { Error::Storage(e.to_string()) }

// ─── Store ───────────────────────────────────────────────────────────────────

/// A student-records store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(storage)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(storage)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
      .map_err(storage)
  }

  /// Run `f` against the connection without an explicit transaction.
  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&rusqlite::Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await.map_err(storage)?
  }

  /// Run `f` inside one transaction. Commits only when `f` succeeds; any
  /// error rolls back every write `f` performed.
  async fn write<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let out = f(&tx);
        if out.is_ok() {
          tx.commit()?;
        }
        Ok(out)
      })
      .await
      .map_err(storage)?
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

fn fetch_student(
  conn: &rusqlite::Connection,
  id: Uuid,
) -> Result<Option<Student>> {
  let raw = conn
    .query_row(
      &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE student_id = ?1"),
      params![encode_uuid(id)],
      RawStudent::from_row,
    )
    .optional()
    .map_err(storage)?;
  raw.map(RawStudent::into_student).transpose()
}

fn require_student(conn: &rusqlite::Connection, id: Uuid) -> Result<Student> {
  fetch_student(conn, id)?.ok_or(Error::StudentNotFound(id))
}

fn email_taken(conn: &rusqlite::Connection, email: &str) -> Result<bool> {
  let taken = conn
    .query_row(
      "SELECT 1 FROM students WHERE email = ?1",
      params![email],
      |_| Ok(true),
    )
    .optional()
    .map_err(storage)?
    .unwrap_or(false);
  Ok(taken)
}

fn insert_student(conn: &rusqlite::Connection, s: &Student) -> Result<()> {
  conn
    .execute(
      "INSERT INTO students (
         student_id, matricule, nom, prenom, email, statut,
         id_departement, id_parcours, est_ancien, annee_sortie,
         motif_sortie, dernier_niveau, nombre_reinscriptions,
         date_derniere_reinscription, motif_reinscription, motif_rejet,
         date_soumission, date_validation, valide_par_admin_id,
         date_inscription, date_creation
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                 ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
      params![
        encode_uuid(s.student_id),
        s.matricule,
        s.nom,
        s.prenom,
        s.email,
        s.statut.to_string(),
        s.id_departement,
        s.id_parcours,
        s.est_ancien,
        s.annee_sortie,
        s.motif_sortie,
        s.dernier_niveau,
        s.nombre_reinscriptions as i64,
        s.date_derniere_reinscription.map(encode_date),
        s.motif_reinscription,
        s.motif_rejet,
        s.date_soumission.map(encode_dt),
        s.date_validation.map(encode_dt),
        s.valide_par_admin_id.map(encode_uuid),
        s.date_inscription.map(encode_date),
        encode_dt(s.date_creation),
      ],
    )
    .map_err(storage)?;
  Ok(())
}

/// Write back every mutable column of a student row.
fn update_student(conn: &rusqlite::Connection, s: &Student) -> Result<()> {
  conn
    .execute(
      "UPDATE students SET
         matricule = ?2, nom = ?3, prenom = ?4, email = ?5, statut = ?6,
         id_departement = ?7, id_parcours = ?8, est_ancien = ?9,
         annee_sortie = ?10, motif_sortie = ?11, dernier_niveau = ?12,
         nombre_reinscriptions = ?13, date_derniere_reinscription = ?14,
         motif_reinscription = ?15, motif_rejet = ?16, date_soumission = ?17,
         date_validation = ?18, valide_par_admin_id = ?19,
         date_inscription = ?20
       WHERE student_id = ?1",
      params![
        encode_uuid(s.student_id),
        s.matricule,
        s.nom,
        s.prenom,
        s.email,
        s.statut.to_string(),
        s.id_departement,
        s.id_parcours,
        s.est_ancien,
        s.annee_sortie,
        s.motif_sortie,
        s.dernier_niveau,
        s.nombre_reinscriptions as i64,
        s.date_derniere_reinscription.map(encode_date),
        s.motif_reinscription,
        s.motif_rejet,
        s.date_soumission.map(encode_dt),
        s.date_validation.map(encode_dt),
        s.valide_par_admin_id.map(encode_uuid),
        s.date_inscription.map(encode_date),
      ],
    )
    .map_err(storage)?;
  Ok(())
}

/// Generate a matricule that is unique in this store. Bounded retries: the
/// five-hex-character suffix can collide, so every candidate is checked
/// inside the assigning transaction.
fn assign_matricule(conn: &rusqlite::Connection, year: i32) -> Result<String> {
  for _ in 0..matricule::MAX_ATTEMPTS {
    let candidate = matricule::generate(year);
    let taken = conn
      .query_row(
        "SELECT 1 FROM students WHERE matricule = ?1",
        params![candidate],
        |_| Ok(true),
      )
      .optional()
      .map_err(storage)?
      .unwrap_or(false);
    if !taken {
      return Ok(candidate);
    }
  }
  Err(Error::IdentifierGeneration {
    attempts: matricule::MAX_ATTEMPTS,
  })
}

fn fetch_enrollment(
  conn: &rusqlite::Connection,
  id: i64,
) -> Result<Option<Enrollment>> {
  let raw = conn
    .query_row(
      &format!(
        "SELECT {ENROLLMENT_COLUMNS} FROM inscriptions WHERE enrollment_id = ?1"
      ),
      params![id],
      RawEnrollment::from_row,
    )
    .optional()
    .map_err(storage)?;
  raw.map(RawEnrollment::into_enrollment).transpose()
}

fn enrollment_exists(
  conn: &rusqlite::Connection,
  student_id: Uuid,
  year: AcademicYear,
) -> Result<bool> {
  let exists = conn
    .query_row(
      "SELECT 1 FROM inscriptions
       WHERE student_id = ?1 AND annee_academique = ?2",
      params![encode_uuid(student_id), year.to_string()],
      |_| Ok(true),
    )
    .optional()
    .map_err(storage)?
    .unwrap_or(false);
  Ok(exists)
}

fn insert_enrollment(
  conn: &rusqlite::Connection,
  input: &NewEnrollment,
  date_inscription: NaiveDate,
) -> Result<Enrollment> {
  conn
    .execute(
      "INSERT INTO inscriptions (
         student_id, annee_academique, niveau, id_departement, id_parcours,
         date_inscription, statut, credits_obtenus
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'en_cours', 0)",
      params![
        encode_uuid(input.student_id),
        input.annee_academique.to_string(),
        input.niveau,
        input.id_departement,
        input.id_parcours,
        encode_date(date_inscription),
      ],
    )
    .map_err(storage)?;

  Ok(Enrollment {
    enrollment_id: conn.last_insert_rowid(),
    student_id: input.student_id,
    annee_academique: input.annee_academique,
    niveau: input.niveau.clone(),
    id_departement: input.id_departement,
    id_parcours: input.id_parcours,
    date_inscription,
    date_validation: None,
    statut: EnrollmentStatus::EnCours,
    moyenne_annuelle: None,
    credits_obtenus: 0,
    est_admis: None,
  })
}

/// Write back the closure columns of an enrollment row.
fn store_enrollment_result(
  conn: &rusqlite::Connection,
  e: &Enrollment,
) -> Result<()> {
  conn
    .execute(
      "UPDATE inscriptions SET statut = ?2, moyenne_annuelle = ?3,
         credits_obtenus = ?4, est_admis = ?5, date_validation = ?6
       WHERE enrollment_id = ?1",
      params![
        e.enrollment_id,
        e.statut.to_string(),
        e.moyenne_annuelle,
        e.credits_obtenus as i64,
        e.est_admis,
        e.date_validation.map(encode_dt),
      ],
    )
    .map_err(storage)?;
  Ok(())
}

fn latest_enrollment_row(
  conn: &rusqlite::Connection,
  student_id: Uuid,
  open_only: bool,
) -> Result<Option<Enrollment>> {
  let filter = if open_only { "AND statut = 'en_cours'" } else { "" };
  let raw = conn
    .query_row(
      &format!(
        "SELECT {ENROLLMENT_COLUMNS} FROM inscriptions
         WHERE student_id = ?1 {filter}
         ORDER BY date_inscription DESC, enrollment_id DESC
         LIMIT 1"
      ),
      params![encode_uuid(student_id)],
      RawEnrollment::from_row,
    )
    .optional()
    .map_err(storage)?;
  raw.map(RawEnrollment::into_enrollment).transpose()
}

/// Append one history row. This is the only code path that writes to
/// `historique_etudiants`; no update or delete exists anywhere.
fn insert_history(
  conn: &rusqlite::Connection,
  entry: &NewHistoryEntry,
  now: DateTime<Utc>,
) -> Result<()> {
  conn
    .execute(
      "INSERT INTO historique_etudiants (
         student_id, annee_academique, date_debut, date_fin, statut, niveau,
         id_departement, id_parcours, est_diplome, motif_fin, notes,
         date_creation
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
      params![
        encode_uuid(entry.student_id),
        entry.annee_academique.to_string(),
        encode_date(entry.date_debut),
        entry.date_fin.map(encode_date),
        entry.statut,
        entry.niveau,
        entry.id_departement,
        entry.id_parcours,
        entry.est_diplome,
        entry.motif_fin,
        entry.notes,
        encode_dt(now),
      ],
    )
    .map_err(storage)?;
  Ok(())
}

/// Build a fresh student record for the two creation paths.
fn new_student_record(
  input: NewStudent,
  statut: StudentStatus,
  now: DateTime<Utc>,
) -> Student {
  Student {
    student_id: Uuid::new_v4(),
    matricule: None,
    nom: input.nom,
    prenom: input.prenom,
    email: input.email,
    statut,
    id_departement: input.id_departement,
    id_parcours: input.id_parcours,
    est_ancien: false,
    annee_sortie: None,
    motif_sortie: None,
    dernier_niveau: None,
    nombre_reinscriptions: 0,
    date_derniere_reinscription: None,
    motif_reinscription: None,
    motif_rejet: None,
    date_soumission: None,
    date_validation: None,
    valide_par_admin_id: None,
    date_inscription: None,
    date_creation: now,
  }
}

// ─── StudentStore impl ───────────────────────────────────────────────────────

impl StudentStore for SqliteStore {
  // ── Student records ───────────────────────────────────────────────────

  async fn create_draft(&self, input: NewStudent) -> Result<Student> {
    self
      .write(move |tx| {
        if email_taken(tx, &input.email)? {
          return Err(Error::DuplicateEmail(input.email));
        }
        let student =
          new_student_record(input, StudentStatus::Brouillon, Utc::now());
        insert_student(tx, &student)?;
        Ok(student)
      })
      .await
  }

  async fn create_validated(&self, input: NewStudent) -> Result<Student> {
    self
      .write(move |tx| {
        if email_taken(tx, &input.email)? {
          return Err(Error::DuplicateEmail(input.email));
        }
        let now = Utc::now();
        let mut student =
          new_student_record(input, StudentStatus::Valide, now);
        student.matricule = Some(assign_matricule(tx, now.year())?);
        student.date_validation = Some(now);
        student.date_inscription = Some(now.date_naive());
        insert_student(tx, &student)?;
        Ok(student)
      })
      .await
  }

  async fn get_student(&self, id: Uuid) -> Result<Option<Student>> {
    self.read(move |conn| fetch_student(conn, id)).await
  }

  async fn list_students(&self, filter: StudentFilter) -> Result<Page<Student>> {
    self
      .read(move |conn| {
        let statut = filter.statut.map(|s| s.to_string());
        let limit = i64::from(filter.limit.unwrap_or(100));
        let offset = i64::from(filter.skip);

        let count: i64 = conn
          .query_row(
            "SELECT COUNT(*) FROM students WHERE (?1 IS NULL OR statut = ?1)",
            params![statut],
            |r| r.get(0),
          )
          .map_err(storage)?;

        let mut stmt = conn
          .prepare(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students
             WHERE (?1 IS NULL OR statut = ?1)
             ORDER BY date_creation DESC
             LIMIT ?2 OFFSET ?3"
          ))
          .map_err(storage)?;
        let raws = stmt
          .query_map(params![statut, limit, offset], RawStudent::from_row)
          .map_err(storage)?
          .collect::<rusqlite::Result<Vec<_>>>()
          .map_err(storage)?;

        let data = raws
          .into_iter()
          .map(RawStudent::into_student)
          .collect::<Result<Vec<_>>>()?;
        Ok(Page { data, count: count as u64 })
      })
      .await
  }

  // ── Application flow ──────────────────────────────────────────────────

  async fn submit_application(&self, id: Uuid) -> Result<Student> {
    self
      .write(move |tx| {
        let mut student = require_student(tx, id)?;
        transition::ensure(student.statut, StudentStatus::EnAttente)?;
        student.statut = StudentStatus::EnAttente;
        student.date_soumission = Some(Utc::now());
        update_student(tx, &student)?;
        Ok(student)
      })
      .await
  }

  async fn validate_application(
    &self,
    id: Uuid,
    admin_id: Option<Uuid>,
  ) -> Result<Student> {
    self
      .write(move |tx| {
        let mut student = require_student(tx, id)?;
        // The table also admits reinscription_en_attente -> valide; this
        // operation is only for first validation.
        if student.statut != StudentStatus::EnAttente {
          return Err(Error::InvalidTransition {
            from: student.statut,
            to:   StudentStatus::Valide,
          });
        }
        transition::ensure(student.statut, StudentStatus::Valide)?;

        let now = Utc::now();
        if student.matricule.is_none() {
          student.matricule = Some(assign_matricule(tx, now.year())?);
        }
        student.statut = StudentStatus::Valide;
        student.date_validation = Some(now);
        student.date_inscription = Some(now.date_naive());
        student.valide_par_admin_id = admin_id;
        update_student(tx, &student)?;
        tracing::info!(
          student_id = %id,
          matricule = student.matricule.as_deref().unwrap_or(""),
          "application validated"
        );
        Ok(student)
      })
      .await
  }

  async fn reject_application(&self, id: Uuid, motif: String) -> Result<Student> {
    self
      .write(move |tx| {
        let mut student = require_student(tx, id)?;
        transition::ensure(student.statut, StudentStatus::Rejette)?;
        student.statut = StudentStatus::Rejette;
        student.motif_rejet = Some(motif);
        update_student(tx, &student)?;
        Ok(student)
      })
      .await
  }

  async fn activate(&self, id: Uuid) -> Result<Student> {
    self
      .write(move |tx| {
        let mut student = require_student(tx, id)?;
        transition::ensure(student.statut, StudentStatus::Actif)?;
        student.statut = StudentStatus::Actif;
        update_student(tx, &student)?;
        Ok(student)
      })
      .await
  }

  async fn deactivate(&self, id: Uuid) -> Result<Student> {
    self
      .write(move |tx| {
        let mut student = require_student(tx, id)?;
        transition::ensure(student.statut, StudentStatus::Desactive)?;
        student.statut = StudentStatus::Desactive;
        update_student(tx, &student)?;
        Ok(student)
      })
      .await
  }

  // ── Exit flow ─────────────────────────────────────────────────────────

  async fn archive_student(
    &self,
    id: Uuid,
    request: ArchiveRequest,
  ) -> Result<Student> {
    self
      .write(move |tx| {
        let mut student = require_student(tx, id)?;
        transition::ensure(student.statut, StudentStatus::Ancien)?;
        let archived_year = AcademicYear::try_ending(request.annee_sortie)?;

        let now = Utc::now();
        let today = now.date_naive();

        // A graduation closes the student's latest open year as passed.
        if request.est_diplome
          && let Some(mut open) = latest_enrollment_row(tx, id, true)?
        {
          open.statut = EnrollmentStatus::Validee;
          open.est_admis = Some(true);
          open.date_validation = Some(now);
          store_enrollment_result(tx, &open)?;
        }

        insert_history(
          tx,
          &NewHistoryEntry {
            student_id:       id,
            annee_academique: archived_year,
            date_debut:       student.date_inscription.unwrap_or(today),
            date_fin:         Some(today),
            statut:           request.motif_sortie.clone(),
            niveau:           request.dernier_niveau.clone(),
            id_departement:   student.id_departement,
            id_parcours:      student.id_parcours,
            est_diplome:      request.est_diplome,
            motif_fin:        Some(request.motif_sortie.clone()),
            notes:            None,
          },
          now,
        )?;

        student.statut = StudentStatus::Ancien;
        student.est_ancien = true;
        student.annee_sortie = Some(request.annee_sortie);
        student.motif_sortie = Some(request.motif_sortie);
        student.dernier_niveau = request.dernier_niveau;
        update_student(tx, &student)?;
        Ok(student)
      })
      .await
  }

  async fn graduate_student(
    &self,
    id: Uuid,
    request: GraduationRequest,
  ) -> Result<Student> {
    self
      .write(move |tx| {
        let mut student = require_student(tx, id)?;
        if student.statut != StudentStatus::Actif {
          return Err(Error::NotActive {
            student_id: id,
            statut:     student.statut,
          });
        }
        transition::ensure(student.statut, StudentStatus::Ancien)?;

        let now = Utc::now();
        let today = now.date_naive();

        let latest = latest_enrollment_row(tx, id, false)?;
        if let Some(e) = latest.as_ref().filter(|e| e.statut.is_open()) {
          let mut closed = e.clone();
          closed.statut = EnrollmentStatus::Validee;
          closed.est_admis = Some(true);
          closed.date_validation = Some(now);
          store_enrollment_result(tx, &closed)?;
        }

        let mention = request.mention.as_deref().unwrap_or("N/A");
        let motif_fin = match &request.mention {
          Some(m) => format!("Diplômé - {} - Mention {m}", request.type_diplome),
          None => format!("Diplômé - {}", request.type_diplome),
        };
        let niveau = latest
          .as_ref()
          .map(|e| e.niveau.clone())
          .or_else(|| student.dernier_niveau.clone());

        insert_history(
          tx,
          &NewHistoryEntry {
            student_id:       id,
            annee_academique: latest
              .as_ref()
              .map(|e| e.annee_academique)
              .unwrap_or_else(|| AcademicYear::ending(now.year())),
            date_debut:       latest
              .as_ref()
              .map(|e| e.date_inscription)
              .or(student.date_inscription)
              .unwrap_or(today),
            date_fin:         Some(today),
            statut:           history::statut::DIPLOME.to_string(),
            niveau:           niveau.clone(),
            id_departement:   student.id_departement,
            id_parcours:      student.id_parcours,
            est_diplome:      true,
            motif_fin:        Some(motif_fin),
            notes:            Some(format!(
              "Type de diplôme: {}, Mention: {mention}",
              request.type_diplome
            )),
          },
          now,
        )?;

        student.statut = StudentStatus::Ancien;
        student.est_ancien = true;
        student.annee_sortie = Some(now.year());
        student.motif_sortie = Some(motif_sortie::DIPLOME.to_string());
        student.dernier_niveau = niveau;
        update_student(tx, &student)?;
        Ok(student)
      })
      .await
  }

  // ── Re-enrollment flow ────────────────────────────────────────────────

  async fn request_reenrollment(
    &self,
    id: Uuid,
    request: ReenrollmentRequest,
  ) -> Result<Student> {
    self
      .write(move |tx| {
        let mut student = require_student(tx, id)?;
        if student.statut == StudentStatus::ReinscriptionEnAttente {
          return Err(Error::ReenrollmentPending(id));
        }
        if !student.est_ancien {
          return Err(Error::NotAlumni(id));
        }
        if student.is_excluded() {
          return Err(Error::ReenrollmentExcluded(id));
        }
        transition::ensure(
          student.statut,
          StudentStatus::ReinscriptionEnAttente,
        )?;

        student.statut = StudentStatus::ReinscriptionEnAttente;
        if request.nouveau_parcours_id.is_some() {
          student.id_parcours = request.nouveau_parcours_id;
        }
        student.motif_reinscription = Some(request.motif_reinscription);
        update_student(tx, &student)?;
        Ok(student)
      })
      .await
  }

  async fn validate_reenrollment(
    &self,
    id: Uuid,
    admin_id: Option<Uuid>,
  ) -> Result<Student> {
    self
      .write(move |tx| {
        let mut student = require_student(tx, id)?;
        if student.statut != StudentStatus::ReinscriptionEnAttente {
          return Err(Error::InvalidTransition {
            from: student.statut,
            to:   StudentStatus::Valide,
          });
        }
        transition::ensure(student.statut, StudentStatus::Valide)?;

        let now = Utc::now();
        let today = now.date_naive();
        let niveau = student
          .dernier_niveau
          .clone()
          .unwrap_or_else(|| "À définir".to_string());
        let notes = match &student.motif_reinscription {
          Some(motif) => format!("Réinscription validée. Motif: {motif}"),
          None => "Réinscription validée.".to_string(),
        };

        insert_history(
          tx,
          &NewHistoryEntry {
            student_id:       id,
            annee_academique: AcademicYear::starting(now.year()),
            date_debut:       today,
            date_fin:         None,
            statut:           history::statut::REINSCRIPTION_VALIDEE.to_string(),
            niveau:           Some(niveau),
            id_departement:   student.id_departement,
            id_parcours:      student.id_parcours,
            est_diplome:      false,
            motif_fin:        None,
            notes:            Some(notes),
          },
          now,
        )?;

        if student.matricule.is_none() {
          student.matricule = Some(assign_matricule(tx, now.year())?);
        }
        student.statut = StudentStatus::Valide;
        student.nombre_reinscriptions += 1;
        student.date_derniere_reinscription = Some(today);
        student.date_validation = Some(now);
        student.valide_par_admin_id = admin_id;
        student.motif_reinscription = None;
        update_student(tx, &student)?;
        Ok(student)
      })
      .await
  }

  // ── Enrollment ledger ─────────────────────────────────────────────────

  async fn create_enrollment(&self, input: NewEnrollment) -> Result<Enrollment> {
    self
      .write(move |tx| {
        let mut student = require_student(tx, input.student_id)?;
        if student.statut != StudentStatus::Actif {
          return Err(Error::NotActive {
            student_id: input.student_id,
            statut:     student.statut,
          });
        }
        if enrollment_exists(tx, input.student_id, input.annee_academique)? {
          return Err(Error::DuplicateEnrollment {
            student_id:       input.student_id,
            annee_academique: input.annee_academique.to_string(),
          });
        }

        let enrollment =
          insert_enrollment(tx, &input, Utc::now().date_naive())?;

        // Track changes caused by the new year on the student record.
        if input.id_departement.is_some() || input.id_parcours.is_some() {
          if input.id_departement.is_some() {
            student.id_departement = input.id_departement;
          }
          if input.id_parcours.is_some() {
            student.id_parcours = input.id_parcours;
          }
          update_student(tx, &student)?;
        }
        Ok(enrollment)
      })
      .await
  }

  async fn close_enrollment(
    &self,
    enrollment_id: i64,
    result: YearResult,
  ) -> Result<Enrollment> {
    self
      .write(move |tx| {
        let mut enrollment = fetch_enrollment(tx, enrollment_id)?
          .ok_or(Error::EnrollmentNotFound(enrollment_id))?;
        if !enrollment.statut.is_open() {
          return Err(Error::AlreadyClosed {
            enrollment_id,
            statut: enrollment.statut.to_string(),
          });
        }

        enrollment.statut = result.closed_status();
        enrollment.est_admis = Some(result.est_admis);
        enrollment.moyenne_annuelle = result.moyenne_annuelle;
        enrollment.credits_obtenus = result.credits_obtenus;
        enrollment.date_validation = Some(Utc::now());
        store_enrollment_result(tx, &enrollment)?;
        Ok(enrollment)
      })
      .await
  }

  async fn enrollments_for_student(&self, id: Uuid) -> Result<Vec<Enrollment>> {
    self
      .read(move |conn| {
        require_student(conn, id)?;
        let mut stmt = conn
          .prepare(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM inscriptions
             WHERE student_id = ?1
             ORDER BY annee_academique DESC"
          ))
          .map_err(storage)?;
        let raws = stmt
          .query_map(params![encode_uuid(id)], RawEnrollment::from_row)
          .map_err(storage)?
          .collect::<rusqlite::Result<Vec<_>>>()
          .map_err(storage)?;
        raws
          .into_iter()
          .map(RawEnrollment::into_enrollment)
          .collect()
      })
      .await
  }

  async fn latest_enrollment(&self, id: Uuid) -> Result<Option<Enrollment>> {
    self
      .read(move |conn| {
        require_student(conn, id)?;
        latest_enrollment_row(conn, id, false)
      })
      .await
  }

  // ── History archive ───────────────────────────────────────────────────

  async fn history_for_student(&self, id: Uuid) -> Result<Vec<HistoryEntry>> {
    self
      .read(move |conn| {
        require_student(conn, id)?;
        let mut stmt = conn
          .prepare(&format!(
            "SELECT {HISTORY_COLUMNS} FROM historique_etudiants
             WHERE student_id = ?1
             ORDER BY date_debut DESC, history_id DESC"
          ))
          .map_err(storage)?;
        let raws = stmt
          .query_map(params![encode_uuid(id)], RawHistoryEntry::from_row)
          .map_err(storage)?
          .collect::<rusqlite::Result<Vec<_>>>()
          .map_err(storage)?;
        raws.into_iter().map(RawHistoryEntry::into_entry).collect()
      })
      .await
  }

  // ── Cohort promotion ──────────────────────────────────────────────────

  async fn promote_cohort(
    &self,
    request: PromotionRequest,
  ) -> Result<PromotionReport> {
    self
      .write(move |tx| {
        let previous = request.annee_academique.previous();
        let today = Utc::now().date_naive();

        let mut stmt = tx
          .prepare(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM inscriptions
             WHERE annee_academique = ?1 AND niveau = ?2
               AND (?3 = 0 OR est_admis = 1)
             ORDER BY enrollment_id"
          ))
          .map_err(storage)?;
        let raws = stmt
          .query_map(
            params![
              previous.to_string(),
              request.niveau_source,
              request.admis_seulement,
            ],
            RawEnrollment::from_row,
          )
          .map_err(storage)?
          .collect::<rusqlite::Result<Vec<_>>>()
          .map_err(storage)?;
        drop(stmt);

        let sources = raws
          .into_iter()
          .map(RawEnrollment::into_enrollment)
          .collect::<Result<Vec<_>>>()?;

        let mut created = 0u32;
        let mut failures = Vec::new();
        for source in sources {
          // Already enrolled for the target year: skip, no error. This is
          // what makes the job safely re-runnable.
          if enrollment_exists(tx, source.student_id, request.annee_academique)?
          {
            continue;
          }
          // A malformed source row is reported but never aborts the batch.
          if source.id_departement.is_none() {
            tracing::warn!(
              enrollment_id = source.enrollment_id,
              student_id = %source.student_id,
              "skipping promotion of source row without department"
            );
            failures.push(PromotionFailure {
              enrollment_id: source.enrollment_id,
              student_id:    source.student_id,
              reason:        "missing department on source enrollment"
                .to_string(),
            });
            continue;
          }
          insert_enrollment(
            tx,
            &NewEnrollment {
              student_id:       source.student_id,
              annee_academique: request.annee_academique,
              niveau:           request.niveau_destination.clone(),
              id_departement:   source.id_departement,
              id_parcours:      source.id_parcours,
            },
            today,
          )?;
          created += 1;
        }

        tracing::info!(
          annee_academique = %request.annee_academique,
          niveau_destination = %request.niveau_destination,
          created,
          failed = failures.len(),
          "cohort promotion complete"
        );
        Ok(PromotionReport {
          annee_academique: request.annee_academique,
          niveau_destination: request.niveau_destination,
          created,
          failures,
        })
      })
      .await
  }

  // ── Alumni ────────────────────────────────────────────────────────────

  async fn list_alumni(&self, filter: AlumniFilter) -> Result<Page<Student>> {
    self
      .read(move |conn| {
        let limit = i64::from(filter.limit.unwrap_or(100));
        let offset = i64::from(filter.skip);
        let conditions = "est_ancien = 1
             AND (?1 IS NULL OR annee_sortie = ?1)
             AND (?2 IS NULL OR motif_sortie = ?2)
             AND (?3 = 0 OR EXISTS (
               SELECT 1 FROM historique_etudiants h
               WHERE h.student_id = students.student_id
                 AND h.est_diplome = 1))";

        let count: i64 = conn
          .query_row(
            &format!("SELECT COUNT(*) FROM students WHERE {conditions}"),
            params![
              filter.annee_sortie,
              filter.motif_sortie,
              filter.diplomes_uniquement,
            ],
            |r| r.get(0),
          )
          .map_err(storage)?;

        let mut stmt = conn
          .prepare(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students
             WHERE {conditions}
             ORDER BY annee_sortie DESC, nom
             LIMIT ?4 OFFSET ?5"
          ))
          .map_err(storage)?;
        let raws = stmt
          .query_map(
            params![
              filter.annee_sortie,
              filter.motif_sortie,
              filter.diplomes_uniquement,
              limit,
              offset,
            ],
            RawStudent::from_row,
          )
          .map_err(storage)?
          .collect::<rusqlite::Result<Vec<_>>>()
          .map_err(storage)?;

        let data = raws
          .into_iter()
          .map(RawStudent::into_student)
          .collect::<Result<Vec<_>>>()?;
        Ok(Page { data, count: count as u64 })
      })
      .await
  }

  async fn search_alumni(&self, query: AlumniSearch) -> Result<Vec<Student>> {
    self
      .read(move |conn| {
        // LIKE is case-insensitive for ASCII in SQLite, which is all the
        // substring matching these lookups need.
        let mut stmt = conn
          .prepare(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students
             WHERE est_ancien = 1
               AND (?1 IS NULL OR email LIKE '%' || ?1 || '%')
               AND (?2 IS NULL
                    OR nom LIKE '%' || ?2 || '%'
                    OR prenom LIKE '%' || ?2 || '%')
               AND (?3 IS NULL OR matricule = ?3)
             ORDER BY nom, prenom
             LIMIT 50"
          ))
          .map_err(storage)?;
        let raws = stmt
          .query_map(
            params![query.email, query.nom, query.matricule],
            RawStudent::from_row,
          )
          .map_err(storage)?
          .collect::<rusqlite::Result<Vec<_>>>()
          .map_err(storage)?;
        raws.into_iter().map(RawStudent::into_student).collect()
      })
      .await
  }

  async fn alumni_statistics(&self) -> Result<AlumniStatistics> {
    self
      .read(|conn| {
        let scalar = |sql: &str| -> Result<i64> {
          conn.query_row(sql, [], |r| r.get(0)).map_err(storage)
        };

        let total_anciens =
          scalar("SELECT COUNT(*) FROM students WHERE est_ancien = 1")?;
        let diplomes = scalar(
          "SELECT COUNT(*) FROM students
           WHERE est_ancien = 1 AND EXISTS (
             SELECT 1 FROM historique_etudiants h
             WHERE h.student_id = students.student_id AND h.est_diplome = 1)",
        )?;
        let abandons = scalar(
          "SELECT COUNT(*) FROM students
           WHERE est_ancien = 1 AND motif_sortie = 'abandon'",
        )?;
        let transferts = scalar(
          "SELECT COUNT(*) FROM students
           WHERE est_ancien = 1 AND motif_sortie = 'transfert'",
        )?;
        let reinscriptions =
          scalar("SELECT COUNT(*) FROM students WHERE nombre_reinscriptions > 0")?;

        Ok(AlumniStatistics {
          total_anciens:  total_anciens as u64,
          diplomes:       diplomes as u64,
          abandons:       abandons as u64,
          transferts:     transferts as u64,
          reinscriptions: reinscriptions as u64,
          taux_diplome:   AlumniStatistics::rate(
            diplomes as u64,
            total_anciens as u64,
          ),
        })
      })
      .await
  }
}
