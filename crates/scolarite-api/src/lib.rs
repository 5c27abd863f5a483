//! JSON REST API for the Scolarité student-records system.
//!
//! Exposes an axum [`Router`] backed by any
//! [`scolarite_core::store::StudentStore`]. Auth, TLS, and transport
//! concerns are the caller's responsibility; the acting admin is identified
//! by the `X-Admin-Id` header where relevant.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", scolarite_api::api_router(store.clone()))
//! ```

pub mod alumni;
pub mod enrollments;
pub mod error;
pub mod students;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use scolarite_core::store::StudentStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: StudentStore + 'static,
{
  Router::new()
    // Creation and lookup
    .route("/students", get(students::list::<S>).post(students::create::<S>))
    .route(
      "/students/public/pre-inscription",
      post(students::pre_inscription::<S>),
    )
    .route(
      "/students/public/pre-inscription/{id}/soumettre",
      post(students::submit::<S>),
    )
    .route("/students/{id}", get(students::get_one::<S>))
    // Application review
    .route("/students/{id}/valider", post(students::validate::<S>))
    .route("/students/{id}/rejeter", post(students::reject::<S>))
    .route("/students/{id}/activer", post(students::activate::<S>))
    .route("/students/{id}/desactiver", post(students::deactivate::<S>))
    // Exit
    .route("/students/{id}/diplomer", post(students::graduate::<S>))
    .route(
      "/students/{id}/marquer-comme-ancien",
      post(students::archive::<S>),
    )
    // Re-enrollment
    .route(
      "/students/demande-reinscription/{id}",
      post(students::request_reenrollment::<S>),
    )
    .route(
      "/students/{id}/valider-reinscription",
      post(students::validate_reenrollment::<S>),
    )
    // Enrollment ledger
    .route("/students/{id}/nouvelle-annee", post(enrollments::new_year::<S>))
    .route(
      "/students/enrollments/{id}/cloturer",
      post(enrollments::close::<S>),
    )
    .route(
      "/students/{id}/inscriptions",
      get(enrollments::list_for_student::<S>),
    )
    .route(
      "/students/inscriptions-massives",
      post(enrollments::promote::<S>),
    )
    // History
    .route("/students/{id}/historique", get(students::history::<S>))
    // Alumni
    .route("/students/anciens", get(alumni::list::<S>))
    .route("/students/anciens/rechercher", get(alumni::search::<S>))
    .route("/students/anciens/statistiques", get(alumni::statistics::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use scolarite_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use super::*;

  async fn make_store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open_in_memory().await.unwrap())
  }

  async fn request(
    store: Arc<SqliteStore>,
    method: &str,
    uri: &str,
    headers: Vec<(&str, &str)>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
      builder = builder.header(k, v);
    }
    let req = match body {
      Some(v) => builder
        .header("content-type", "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    let resp = api_router(store).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      // Extractor rejections (e.g. axum's `JsonRejection`) use plain-text
      // bodies; surface those as a JSON string instead of panicking.
      serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        Value::String(String::from_utf8_lossy(&bytes).into_owned())
      })
    };
    (status, value)
  }

  fn applicant(tag: &str) -> Value {
    json!({
      "nom": "Diallo",
      "prenom": "Aminata",
      "email": format!("{tag}@univ.example"),
      "id_departement": 1,
      "id_parcours": 10,
    })
  }

  /// Create a student through the admin path and activate it.
  async fn active_student(store: &Arc<SqliteStore>, tag: &str) -> String {
    let (status, body) =
      request(store.clone(), "POST", "/students", vec![], Some(applicant(tag)))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["student_id"].as_str().unwrap().to_string();
    let (status, _) = request(
      store.clone(),
      "POST",
      &format!("/students/{id}/activer"),
      vec![],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    id
  }

  // ── Pre-inscription flow ────────────────────────────────────────────────

  #[tokio::test]
  async fn pre_inscription_flow_over_http() {
    let store = make_store().await;

    let (status, body) = request(
      store.clone(),
      "POST",
      "/students/public/pre-inscription",
      vec![],
      Some(applicant("web")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["statut"], "brouillon");
    assert!(body["matricule"].is_null());
    let id = body["student_id"].as_str().unwrap().to_string();

    let (status, body) = request(
      store.clone(),
      "POST",
      &format!("/students/public/pre-inscription/{id}/soumettre"),
      vec![],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["statut"], "en_attente");

    let admin = Uuid::new_v4();
    let (status, body) = request(
      store.clone(),
      "POST",
      &format!("/students/{id}/valider"),
      vec![("x-admin-id", &admin.to_string())],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["statut"], "valide");
    assert_eq!(body["valide_par_admin_id"], admin.to_string());
    assert!(body["matricule"].as_str().unwrap().starts_with("STD"));
  }

  #[tokio::test]
  async fn duplicate_email_maps_to_409() {
    let store = make_store().await;
    request(store.clone(), "POST", "/students", vec![], Some(applicant("dup")))
      .await;
    let (status, body) =
      request(store.clone(), "POST", "/students", vec![], Some(applicant("dup")))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already exists"));
  }

  #[tokio::test]
  async fn illegal_transition_maps_to_400() {
    let store = make_store().await;
    let (_, body) = request(
      store.clone(),
      "POST",
      "/students/public/pre-inscription",
      vec![],
      Some(applicant("early")),
    )
    .await;
    let id = body["student_id"].as_str().unwrap();

    // Validating a brouillon directly is not allowed.
    let (status, body) = request(
      store.clone(),
      "POST",
      &format!("/students/{id}/valider"),
      vec![],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("transition"));
  }

  #[tokio::test]
  async fn unknown_student_maps_to_404() {
    let store = make_store().await;
    let (status, _) = request(
      store.clone(),
      "GET",
      &format!("/students/{}", Uuid::new_v4()),
      vec![],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn malformed_admin_header_maps_to_400() {
    let store = make_store().await;
    let (status, _) = request(
      store.clone(),
      "POST",
      &format!("/students/{}/valider", Uuid::new_v4()),
      vec![("x-admin-id", "not-a-uuid")],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn rejection_requires_a_motif() {
    let store = make_store().await;
    let (_, body) = request(
      store.clone(),
      "POST",
      "/students/public/pre-inscription",
      vec![],
      Some(applicant("refused")),
    )
    .await;
    let id = body["student_id"].as_str().unwrap().to_string();
    request(
      store.clone(),
      "POST",
      &format!("/students/public/pre-inscription/{id}/soumettre"),
      vec![],
      None,
    )
    .await;

    let (status, body) = request(
      store.clone(),
      "POST",
      &format!("/students/{id}/rejeter"),
      vec![],
      Some(json!({"motif": "dossier incomplet"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["statut"], "rejette");
    assert_eq!(body["motif_rejet"], "dossier incomplet");
  }

  #[tokio::test]
  async fn list_students_filters_by_statut() {
    let store = make_store().await;
    request(
      store.clone(),
      "POST",
      "/students/public/pre-inscription",
      vec![],
      Some(applicant("d1")),
    )
    .await;
    active_student(&store, "a1").await;

    let (status, body) = request(
      store.clone(),
      "GET",
      "/students?statut=brouillon",
      vec![],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["statut"], "brouillon");
  }

  // ── Enrollment ledger ───────────────────────────────────────────────────

  #[tokio::test]
  async fn enrollment_round_trip_over_http() {
    let store = make_store().await;
    let id = active_student(&store, "enrolled").await;

    let (status, body) = request(
      store.clone(),
      "POST",
      &format!("/students/{id}/nouvelle-annee"),
      vec![],
      Some(json!({
        "annee_academique": "2024-2025",
        "niveau": "L1",
        "id_departement": 1,
      })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["statut"], "en_cours");
    let enrollment_id = body["enrollment_id"].as_i64().unwrap();

    // A second enrollment for the same academic year is rejected.
    let (status, _) = request(
      store.clone(),
      "POST",
      &format!("/students/{id}/nouvelle-annee"),
      vec![],
      Some(json!({"annee_academique": "2024-2025", "niveau": "L1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = request(
      store.clone(),
      "POST",
      &format!("/students/enrollments/{enrollment_id}/cloturer"),
      vec![],
      Some(json!({
        "est_admis": true,
        "moyenne_annuelle": 14.2,
        "credits_obtenus": 60,
      })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["statut"], "validée");
    assert_eq!(body["est_admis"], true);

    let (status, body) = request(
      store.clone(),
      "GET",
      &format!("/students/{id}/inscriptions"),
      vec![],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn closing_twice_maps_to_400() {
    let store = make_store().await;
    let id = active_student(&store, "once").await;
    let (_, body) = request(
      store.clone(),
      "POST",
      &format!("/students/{id}/nouvelle-annee"),
      vec![],
      Some(json!({"annee_academique": "2024-2025", "niveau": "L1"})),
    )
    .await;
    let enrollment_id = body["enrollment_id"].as_i64().unwrap();
    let close_body = json!({"est_admis": false, "moyenne_annuelle": 6.0});

    let (status, _) = request(
      store.clone(),
      "POST",
      &format!("/students/enrollments/{enrollment_id}/cloturer"),
      vec![],
      Some(close_body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(
      store.clone(),
      "POST",
      &format!("/students/enrollments/{enrollment_id}/cloturer"),
      vec![],
      Some(close_body),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn invalid_academic_year_maps_to_422() {
    let store = make_store().await;
    let id = active_student(&store, "badyear").await;
    let (status, _) = request(
      store.clone(),
      "POST",
      &format!("/students/{id}/nouvelle-annee"),
      vec![],
      Some(json!({"annee_academique": "2024-2026", "niveau": "L1"})),
    )
    .await;
    // Rejected by body deserialization before reaching the store.
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  }

  #[tokio::test]
  async fn promotion_job_over_http() {
    let store = make_store().await;
    let id = active_student(&store, "mover").await;
    let (_, body) = request(
      store.clone(),
      "POST",
      &format!("/students/{id}/nouvelle-annee"),
      vec![],
      Some(json!({
        "annee_academique": "2023-2024",
        "niveau": "L1",
        "id_departement": 1,
      })),
    )
    .await;
    let enrollment_id = body["enrollment_id"].as_i64().unwrap();
    request(
      store.clone(),
      "POST",
      &format!("/students/enrollments/{enrollment_id}/cloturer"),
      vec![],
      Some(json!({"est_admis": true, "credits_obtenus": 60})),
    )
    .await;

    let (status, body) = request(
      store.clone(),
      "POST",
      "/students/inscriptions-massives",
      vec![],
      Some(json!({
        "annee_academique": "2024-2025",
        "niveau_source": "L1",
        "niveau_destination": "L2",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], 1);
    assert_eq!(body["failures"].as_array().unwrap().len(), 0);
  }

  // ── Exit, history, alumni ───────────────────────────────────────────────

  #[tokio::test]
  async fn graduation_and_alumni_endpoints() {
    let store = make_store().await;
    let id = active_student(&store, "finisher").await;

    let (status, body) = request(
      store.clone(),
      "POST",
      &format!("/students/{id}/diplomer"),
      vec![],
      Some(json!({"type_diplome": "Master", "mention": "Bien"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["statut"], "ancien");
    assert_eq!(body["est_ancien"], true);

    let (status, body) = request(
      store.clone(),
      "GET",
      &format!("/students/{id}/historique"),
      vec![],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["est_diplome"], true);

    let (status, body) = request(
      store.clone(),
      "GET",
      "/students/anciens?diplomes_uniquement=true",
      vec![],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, body) = request(
      store.clone(),
      "GET",
      "/students/anciens/statistiques",
      vec![],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_anciens"], 1);
    assert_eq!(body["diplomes"], 1);
    assert_eq!(body["taux_diplome"], 100.0);
  }

  #[tokio::test]
  async fn alumni_search_over_http() {
    let store = make_store().await;
    let id = active_student(&store, "findme").await;
    request(
      store.clone(),
      "POST",
      &format!("/students/{id}/marquer-comme-ancien"),
      vec![],
      Some(json!({"annee_sortie": 2024, "motif_sortie": "abandon"})),
    )
    .await;

    let (status, body) = request(
      store.clone(),
      "GET",
      "/students/anciens/rechercher?email=findme",
      vec![],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let hits = body.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["student_id"], id);

    let (status, body) = request(
      store.clone(),
      "GET",
      "/students/anciens/rechercher?nom=nobody",
      vec![],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn reenrollment_flow_over_http() {
    let store = make_store().await;
    let id = active_student(&store, "returning").await;
    request(
      store.clone(),
      "POST",
      &format!("/students/{id}/marquer-comme-ancien"),
      vec![],
      Some(json!({
        "annee_sortie": 2024,
        "motif_sortie": "abandon",
        "dernier_niveau": "L2",
      })),
    )
    .await;

    let (status, body) = request(
      store.clone(),
      "POST",
      &format!("/students/demande-reinscription/{id}"),
      vec![],
      Some(json!({"motif_reinscription": "reprise d'études"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["statut"], "reinscription_en_attente");

    let admin = Uuid::new_v4();
    let (status, body) = request(
      store.clone(),
      "POST",
      &format!("/students/{id}/valider-reinscription"),
      vec![("x-admin-id", &admin.to_string())],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["statut"], "valide");
    assert_eq!(body["nombre_reinscriptions"], 1);
  }

  #[tokio::test]
  async fn excluded_alumni_cannot_reenroll_over_http() {
    let store = make_store().await;
    let id = active_student(&store, "expelled").await;
    request(
      store.clone(),
      "POST",
      &format!("/students/{id}/marquer-comme-ancien"),
      vec![],
      Some(json!({"annee_sortie": 2024, "motif_sortie": "exclusion"})),
    )
    .await;

    let (status, body) = request(
      store.clone(),
      "POST",
      &format!("/students/demande-reinscription/{id}"),
      vec![],
      Some(json!({"motif_reinscription": "retour"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("excluded"));
  }
}
