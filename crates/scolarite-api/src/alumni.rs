//! Handlers for the alumni endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET` | `/students/anciens` | `?annee_sortie=`, `?motif_sortie=`, `?diplomes_uniquement=` |
//! | `GET` | `/students/anciens/rechercher` | `?email=`, `?nom=`, `?matricule=` |
//! | `GET` | `/students/anciens/statistiques` | Aggregate counts |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use scolarite_core::{
  store::{AlumniFilter, AlumniSearch, AlumniStatistics, Page, StudentStore},
  student::Student,
};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct AlumniParams {
  pub annee_sortie:        Option<i32>,
  pub motif_sortie:        Option<String>,
  pub diplomes_uniquement: Option<bool>,
  pub skip:                Option<u32>,
  pub limit:               Option<u32>,
}

/// `GET /students/anciens`
pub async fn list<S: StudentStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<AlumniParams>,
) -> Result<Json<Page<Student>>, ApiError> {
  let page = store
    .list_alumni(AlumniFilter {
      annee_sortie:        params.annee_sortie,
      motif_sortie:        params.motif_sortie,
      diplomes_uniquement: params.diplomes_uniquement.unwrap_or(false),
      skip:                params.skip.unwrap_or(0),
      limit:               params.limit,
    })
    .await?;
  Ok(Json(page))
}

/// `GET /students/anciens/rechercher`
pub async fn search<S: StudentStore>(
  State(store): State<Arc<S>>,
  Query(query): Query<AlumniSearch>,
) -> Result<Json<Vec<Student>>, ApiError> {
  Ok(Json(store.search_alumni(query).await?))
}

/// `GET /students/anciens/statistiques`
pub async fn statistics<S: StudentStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<AlumniStatistics>, ApiError> {
  Ok(Json(store.alumni_statistics().await?))
}
