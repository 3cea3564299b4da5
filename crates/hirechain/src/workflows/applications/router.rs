use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{Actor, ActorRole, ApplicationId, ProofUpload};
use super::lifecycle::LifecycleError;
use super::service::{ApplicationService, ApplicationServiceError};
use super::store::{ApplicationQuery, ApplicationStore, StoreError};
use crate::workflows::ledger::{Ledger, LedgerError};
use crate::workflows::marketplace::{CandidateId, JobId, LocationType};
use crate::workflows::matching::{compatibility_score, MatchPreferences};

pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";
pub const ACTOR_ID_HEADER: &str = "x-actor-id";

/// Router builder exposing application, recommendation, and scoring endpoints.
pub fn application_router<S, L>(service: Arc<ApplicationService<S, L>>) -> Router
where
    S: ApplicationStore + 'static,
    L: Ledger + 'static,
{
    Router::new()
        .route(
            "/api/v1/applications",
            post(submit_handler::<S, L>).get(list_handler::<S, L>),
        )
        .route("/api/v1/applications/stats", get(stats_handler::<S, L>))
        .route(
            "/api/v1/applications/:application_id",
            get(get_handler::<S, L>),
        )
        .route(
            "/api/v1/applications/:application_id/approve",
            post(approve_handler::<S, L>),
        )
        .route(
            "/api/v1/applications/:application_id/reject",
            post(reject_handler::<S, L>),
        )
        .route(
            "/api/v1/applications/:application_id/proof",
            post(proof_handler::<S, L>),
        )
        .route(
            "/api/v1/applications/:application_id/verify",
            post(verify_handler::<S, L>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/recommendations",
            get(recommendations_handler::<S, L>),
        )
        .route("/api/v1/compatibility", post(compatibility_handler))
        .with_state(service)
}

#[axum::async_trait]
impl<St: Send + Sync> FromRequestParts<St> for Actor {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        let role = header(ACTOR_ROLE_HEADER)
            .and_then(ActorRole::from_label)
            .ok_or_else(|| unauthorized("missing or unknown x-actor-role header"))?;
        let id = header(ACTOR_ID_HEADER)
            .ok_or_else(|| unauthorized("missing x-actor-id header"))?
            .to_string();

        Ok(Actor { role, id })
    }
}

fn unauthorized(message: &str) -> Response {
    let payload = json!({ "error": message });
    (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response()
}

pub(crate) fn status_for(error: &ApplicationServiceError) -> StatusCode {
    match error {
        ApplicationServiceError::Lifecycle(LifecycleError::InvalidTransition { .. }) => {
            StatusCode::CONFLICT
        }
        ApplicationServiceError::Lifecycle(LifecycleError::NotParty { .. }) => {
            StatusCode::FORBIDDEN
        }
        ApplicationServiceError::Lifecycle(
            LifecycleError::InvalidProof(_) | LifecycleError::MissingAttestation,
        ) => StatusCode::UNPROCESSABLE_ENTITY,
        ApplicationServiceError::Store(StoreError::DuplicateApplication { .. })
        | ApplicationServiceError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
        ApplicationServiceError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
        ApplicationServiceError::Store(StoreError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ApplicationServiceError::Ledger(LedgerError::NotFound { .. }) => StatusCode::NOT_FOUND,
        ApplicationServiceError::Ledger(LedgerError::AlreadyExists { .. }) => StatusCode::CONFLICT,
        ApplicationServiceError::Ledger(
            LedgerError::UpstreamUnavailable(_) | LedgerError::Decode { .. },
        ) => StatusCode::BAD_GATEWAY,
        ApplicationServiceError::Matching(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ApplicationServiceError::RoleRequired { .. } => StatusCode::FORBIDDEN,
        ApplicationServiceError::JobClosed(_) => StatusCode::CONFLICT,
    }
}

pub(crate) fn error_response(error: ApplicationServiceError) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (status_for(&error), axum::Json(payload)).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitRequest {
    pub job_id: JobId,
    #[serde(default)]
    pub ai_applied: bool,
}

pub(crate) async fn submit_handler<S, L>(
    State(service): State<Arc<ApplicationService<S, L>>>,
    actor: Actor,
    axum::Json(request): axum::Json<SubmitRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
    L: Ledger + 'static,
{
    match service.submit(&actor, &request.job_id, request.ai_applied) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<S, L>(
    State(service): State<Arc<ApplicationService<S, L>>>,
    Query(query): Query<ApplicationQuery>,
) -> Response
where
    S: ApplicationStore + 'static,
    L: Ledger + 'static,
{
    match service.list(&query) {
        Ok(records) => (StatusCode::OK, axum::Json(records)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn stats_handler<S, L>(
    State(service): State<Arc<ApplicationService<S, L>>>,
    Query(query): Query<ApplicationQuery>,
) -> Response
where
    S: ApplicationStore + 'static,
    L: Ledger + 'static,
{
    match service.stats(&query) {
        Ok(stats) => (StatusCode::OK, axum::Json(stats)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_handler<S, L>(
    State(service): State<Arc<ApplicationService<S, L>>>,
    Path(application_id): Path<String>,
) -> Response
where
    S: ApplicationStore + 'static,
    L: Ledger + 'static,
{
    match service.get(&ApplicationId(application_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn approve_handler<S, L>(
    State(service): State<Arc<ApplicationService<S, L>>>,
    Path(application_id): Path<String>,
    actor: Actor,
) -> Response
where
    S: ApplicationStore + 'static,
    L: Ledger + 'static,
{
    match service.approve(&ApplicationId(application_id), &actor) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reject_handler<S, L>(
    State(service): State<Arc<ApplicationService<S, L>>>,
    Path(application_id): Path<String>,
    actor: Actor,
) -> Response
where
    S: ApplicationStore + 'static,
    L: Ledger + 'static,
{
    match service.reject(&ApplicationId(application_id), &actor) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn proof_handler<S, L>(
    State(service): State<Arc<ApplicationService<S, L>>>,
    Path(application_id): Path<String>,
    actor: Actor,
    axum::Json(upload): axum::Json<ProofUpload>,
) -> Response
where
    S: ApplicationStore + 'static,
    L: Ledger + 'static,
{
    match service.upload_proof(&ApplicationId(application_id), &actor, upload) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct VerifyRequest {
    pub attestation: String,
}

pub(crate) async fn verify_handler<S, L>(
    State(service): State<Arc<ApplicationService<S, L>>>,
    Path(application_id): Path<String>,
    actor: Actor,
    axum::Json(request): axum::Json<VerifyRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
    L: Ledger + 'static,
{
    match service.verify(&ApplicationId(application_id), &actor, request.attestation) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RecommendationParams {
    pub minimum_score: Option<u8>,
    /// Comma separated location categories.
    pub locations: Option<String>,
}

impl RecommendationParams {
    fn preferences(&self) -> Result<MatchPreferences, String> {
        let mut preferences = MatchPreferences::default();
        if let Some(minimum) = self.minimum_score {
            preferences.minimum_score = minimum;
        }
        if let Some(raw) = &self.locations {
            preferences.locations = raw
                .split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(|entry| {
                    LocationType::from_label(entry)
                        .ok_or_else(|| format!("unknown location category '{entry}'"))
                })
                .collect::<Result<_, _>>()?;
        }
        Ok(preferences)
    }
}

pub(crate) async fn recommendations_handler<S, L>(
    State(service): State<Arc<ApplicationService<S, L>>>,
    Path(candidate_id): Path<String>,
    Query(params): Query<RecommendationParams>,
) -> Response
where
    S: ApplicationStore + 'static,
    L: Ledger + 'static,
{
    let preferences = match params.preferences() {
        Ok(preferences) => preferences,
        Err(message) => {
            let payload = json!({ "error": message });
            return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
        }
    };

    match service.recommendations(&CandidateId::new(candidate_id), &preferences) {
        Ok(jobs) => (StatusCode::OK, axum::Json(jobs)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompatibilityRequest {
    pub job_skills: Vec<String>,
    #[serde(default)]
    pub candidate_skills: Vec<String>,
}

pub(crate) async fn compatibility_handler(
    axum::Json(request): axum::Json<CompatibilityRequest>,
) -> Response {
    match compatibility_score(&request.job_skills, &request.candidate_skills) {
        Ok(score) => (StatusCode::OK, axum::Json(json!({ "score": score }))).into_response(),
        Err(error) => error_response(error.into()),
    }
}
