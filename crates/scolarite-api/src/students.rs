//! Handlers for the student lifecycle endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/students/public/pre-inscription` | Self-service draft, 201 |
//! | `POST` | `/students/public/pre-inscription/:id/soumettre` | `brouillon -> en_attente` |
//! | `POST` | `/students` | Direct admin enrollment, 201 |
//! | `GET`  | `/students` | Optional `?statut=`, `?skip=`, `?limit=` |
//! | `GET`  | `/students/:id` | 404 if not found |
//! | `POST` | `/students/:id/valider` | Admin identity via `X-Admin-Id` |
//! | `POST` | `/students/:id/rejeter` | Body: `{"motif": "..."}` |
//! | `POST` | `/students/:id/activer` | |
//! | `POST` | `/students/:id/desactiver` | |
//! | `POST` | `/students/:id/diplomer` | |
//! | `POST` | `/students/:id/marquer-comme-ancien` | |
//! | `POST` | `/students/demande-reinscription/:id` | |
//! | `POST` | `/students/:id/valider-reinscription` | Admin via `X-Admin-Id` |
//! | `GET`  | `/students/:id/historique` | |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use scolarite_core::{
  history::HistoryEntry,
  store::{
    ArchiveRequest, GraduationRequest, Page, ReenrollmentRequest, StudentFilter,
    StudentStore,
  },
  student::{NewStudent, Student, StudentStatus},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// Extract the optional acting-admin identity from the `X-Admin-Id` header.
pub(crate) fn admin_id(headers: &HeaderMap) -> Result<Option<Uuid>, ApiError> {
  let Some(value) = headers.get("x-admin-id") else {
    return Ok(None);
  };
  let s = value
    .to_str()
    .map_err(|_| ApiError::BadRequest("malformed X-Admin-Id header".into()))?;
  let id = Uuid::parse_str(s)
    .map_err(|_| ApiError::BadRequest(format!("invalid X-Admin-Id: {s:?}")))?;
  Ok(Some(id))
}

// ─── Creation ─────────────────────────────────────────────────────────────────

/// `POST /students/public/pre-inscription`
pub async fn pre_inscription<S: StudentStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewStudent>,
) -> Result<impl IntoResponse, ApiError> {
  let student = store.create_draft(body).await?;
  Ok((StatusCode::CREATED, Json(student)))
}

/// `POST /students/public/pre-inscription/:id/soumettre`
pub async fn submit<S: StudentStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Student>, ApiError> {
  Ok(Json(store.submit_application(id).await?))
}

/// `POST /students` — the admin path; the record is created already
/// validated with its matricule.
pub async fn create<S: StudentStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewStudent>,
) -> Result<impl IntoResponse, ApiError> {
  let student = store.create_validated(body).await?;
  Ok((StatusCode::CREATED, Json(student)))
}

// ─── Lookup ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub statut: Option<StudentStatus>,
  pub skip:   Option<u32>,
  pub limit:  Option<u32>,
}

/// `GET /students[?statut=<statut>&skip=<n>&limit=<n>]`
pub async fn list<S: StudentStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Page<Student>>, ApiError> {
  let page = store
    .list_students(StudentFilter {
      statut: params.statut,
      skip:   params.skip.unwrap_or(0),
      limit:  params.limit,
    })
    .await?;
  Ok(Json(page))
}

/// `GET /students/:id`
pub async fn get_one<S: StudentStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Student>, ApiError> {
  let student = store
    .get_student(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("student {id} not found")))?;
  Ok(Json(student))
}

// ─── Application review ───────────────────────────────────────────────────────

/// `POST /students/:id/valider`
pub async fn validate<S: StudentStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
) -> Result<Json<Student>, ApiError> {
  let admin = admin_id(&headers)?;
  Ok(Json(store.validate_application(id, admin).await?))
}

#[derive(Debug, Deserialize)]
pub struct RejectBody {
  pub motif: String,
}

/// `POST /students/:id/rejeter` — body: `{"motif":"..."}`
pub async fn reject<S: StudentStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<RejectBody>,
) -> Result<Json<Student>, ApiError> {
  Ok(Json(store.reject_application(id, body.motif).await?))
}

/// `POST /students/:id/activer`
pub async fn activate<S: StudentStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Student>, ApiError> {
  Ok(Json(store.activate(id).await?))
}

/// `POST /students/:id/desactiver`
pub async fn deactivate<S: StudentStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Student>, ApiError> {
  Ok(Json(store.deactivate(id).await?))
}

// ─── Exit ─────────────────────────────────────────────────────────────────────

/// `POST /students/:id/diplomer` — body: `{"type_diplome":"...", "mention":...}`
pub async fn graduate<S: StudentStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<GraduationRequest>,
) -> Result<Json<Student>, ApiError> {
  Ok(Json(store.graduate_student(id, body).await?))
}

/// `POST /students/:id/marquer-comme-ancien`
pub async fn archive<S: StudentStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ArchiveRequest>,
) -> Result<Json<Student>, ApiError> {
  Ok(Json(store.archive_student(id, body).await?))
}

// ─── Re-enrollment ────────────────────────────────────────────────────────────

/// `POST /students/demande-reinscription/:id`
pub async fn request_reenrollment<S: StudentStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ReenrollmentRequest>,
) -> Result<Json<Student>, ApiError> {
  Ok(Json(store.request_reenrollment(id, body).await?))
}

/// `POST /students/:id/valider-reinscription`
pub async fn validate_reenrollment<S: StudentStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
) -> Result<Json<Student>, ApiError> {
  let admin = admin_id(&headers)?;
  Ok(Json(store.validate_reenrollment(id, admin).await?))
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /students/:id/historique`
pub async fn history<S: StudentStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
  Ok(Json(store.history_for_student(id).await?))
}
