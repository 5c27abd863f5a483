//! Handlers for the enrollment-ledger endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/students/:id/nouvelle-annee` | New `en_cours` year |
//! | `POST` | `/students/enrollments/:id/cloturer` | Year-end results, once |
//! | `GET`  | `/students/:id/inscriptions` | Newest year first |
//! | `POST` | `/students/inscriptions-massives` | Cohort promotion job |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use scolarite_core::{
  AcademicYear,
  enrollment::{Enrollment, NewEnrollment, YearResult},
  store::{PromotionReport, PromotionRequest, StudentStore},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── New year ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NewYearBody {
  pub annee_academique: AcademicYear,
  pub niveau:           String,
  pub id_departement:   Option<i64>,
  pub id_parcours:      Option<i64>,
}

/// `POST /students/:id/nouvelle-annee`
pub async fn new_year<S: StudentStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<NewYearBody>,
) -> Result<Json<Enrollment>, ApiError> {
  let enrollment = store
    .create_enrollment(NewEnrollment {
      student_id:       id,
      annee_academique: body.annee_academique,
      niveau:           body.niveau,
      id_departement:   body.id_departement,
      id_parcours:      body.id_parcours,
    })
    .await?;
  Ok(Json(enrollment))
}

// ─── Closure ──────────────────────────────────────────────────────────────────

/// `POST /students/enrollments/:id/cloturer` — body:
/// `{"est_admis":true,"moyenne_annuelle":13.5,"credits_obtenus":60}`
pub async fn close<S: StudentStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
  Json(body): Json<YearResult>,
) -> Result<Json<Enrollment>, ApiError> {
  Ok(Json(store.close_enrollment(id, body).await?))
}

// ─── Listing ──────────────────────────────────────────────────────────────────

/// `GET /students/:id/inscriptions`
pub async fn list_for_student<S: StudentStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Enrollment>>, ApiError> {
  Ok(Json(store.enrollments_for_student(id).await?))
}

// ─── Promotion ────────────────────────────────────────────────────────────────

fn default_admis_seulement() -> bool { true }

#[derive(Debug, Deserialize)]
pub struct PromotionBody {
  pub annee_academique:   AcademicYear,
  pub niveau_source:      String,
  pub niveau_destination: String,
  #[serde(default = "default_admis_seulement")]
  pub admis_seulement:    bool,
}

/// `POST /students/inscriptions-massives` — run the year-to-year cohort
/// promotion job. Per-row failures come back in the report, not as an error
/// status.
pub async fn promote<S: StudentStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<PromotionBody>,
) -> Result<Json<PromotionReport>, ApiError> {
  let report = store
    .promote_cohort(PromotionRequest {
      annee_academique:   body.annee_academique,
      niveau_source:      body.niveau_source,
      niveau_destination: body.niveau_destination,
      admis_seulement:    body.admis_seulement,
    })
    .await?;
  Ok(Json(report))
}
