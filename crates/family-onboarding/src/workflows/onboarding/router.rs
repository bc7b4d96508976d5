use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::delivery::{Notifier, ObjectStore};
use super::member::MemberUpdate;
use super::registry::{LockOutcome, RegistryError, ValidationError};
use super::repository::{RepositoryError, SessionId, SessionRepository};
use super::service::{OnboardingService, OnboardingServiceError};
use super::session::SessionError;
use super::submission::SubmissionError;

type SharedService<R, S, N> = Arc<OnboardingService<R, S, N>>;

#[derive(Debug, Deserialize)]
pub struct ConfirmFamilyRequest {
    #[serde(default)]
    pub head_name: String,
    #[serde(default)]
    pub head_age: i32,
    pub member_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct SelectActiveRequest {
    pub index: usize,
}

/// Router builder exposing the onboarding session endpoints.
pub fn onboarding_router<R, S, N>(service: SharedService<R, S, N>) -> Router
where
    R: SessionRepository + 'static,
    S: ObjectStore + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/onboarding/sessions",
            post(create_session_handler::<R, S, N>),
        )
        .route(
            "/api/v1/onboarding/sessions/:session_id",
            get(status_handler::<R, S, N>),
        )
        .route(
            "/api/v1/onboarding/sessions/:session_id/family",
            post(confirm_family_handler::<R, S, N>),
        )
        .route(
            "/api/v1/onboarding/sessions/:session_id/active",
            put(select_active_handler::<R, S, N>),
        )
        .route(
            "/api/v1/onboarding/sessions/:session_id/members/:index/updates",
            post(member_update_handler::<R, S, N>),
        )
        .route(
            "/api/v1/onboarding/sessions/:session_id/lock",
            post(lock_handler::<R, S, N>),
        )
        .route(
            "/api/v1/onboarding/sessions/:session_id/submit",
            post(submit_handler::<R, S, N>),
        )
        .route(
            "/api/v1/onboarding/sessions/:session_id/archive",
            get(archive_handler::<R, S, N>),
        )
        .with_state(service)
}

pub(crate) async fn create_session_handler<R, S, N>(
    State(service): State<SharedService<R, S, N>>,
) -> Response
where
    R: SessionRepository + 'static,
    S: ObjectStore + 'static,
    N: Notifier + 'static,
{
    match service.create_session() {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<R, S, N>(
    State(service): State<SharedService<R, S, N>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    S: ObjectStore + 'static,
    N: Notifier + 'static,
{
    match service.status(&SessionId(session_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn confirm_family_handler<R, S, N>(
    State(service): State<SharedService<R, S, N>>,
    Path(session_id): Path<String>,
    Json(request): Json<ConfirmFamilyRequest>,
) -> Response
where
    R: SessionRepository + 'static,
    S: ObjectStore + 'static,
    N: Notifier + 'static,
{
    let result = service.confirm_family(
        &SessionId(session_id),
        &request.head_name,
        request.head_age,
        request.member_count,
    );
    match result {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn select_active_handler<R, S, N>(
    State(service): State<SharedService<R, S, N>>,
    Path(session_id): Path<String>,
    Json(request): Json<SelectActiveRequest>,
) -> Response
where
    R: SessionRepository + 'static,
    S: ObjectStore + 'static,
    N: Notifier + 'static,
{
    match service.select_active(&SessionId(session_id), request.index) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn member_update_handler<R, S, N>(
    State(service): State<SharedService<R, S, N>>,
    Path((session_id, index)): Path<(String, usize)>,
    Json(update): Json<MemberUpdate>,
) -> Response
where
    R: SessionRepository + 'static,
    S: ObjectStore + 'static,
    N: Notifier + 'static,
{
    match service.apply_update(&SessionId(session_id), index, update) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn lock_handler<R, S, N>(
    State(service): State<SharedService<R, S, N>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    S: ObjectStore + 'static,
    N: Notifier + 'static,
{
    match service.lock_active(&SessionId(session_id)) {
        Ok((view, outcome)) => {
            let (next_index, ready) = match outcome {
                LockOutcome::Advanced { next_index } => (Some(next_index), false),
                LockOutcome::ReadyForSubmission => (None, true),
            };
            let payload = json!({
                "session": view,
                "next_index": next_index,
                "ready_for_submission": ready,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn submit_handler<R, S, N>(
    State(service): State<SharedService<R, S, N>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    S: ObjectStore + 'static,
    N: Notifier + 'static,
{
    // Delivery blocks on the object store and notifier.
    let outcome =
        tokio::task::spawn_blocking(move || service.submit(&SessionId(session_id))).await;
    match outcome {
        Ok(Ok(receipt)) => (StatusCode::OK, Json(receipt)).into_response(),
        Ok(Err(err)) => error_response(err),
        Err(join_error) => {
            error!(error = %join_error, "submission task did not complete");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "submission task did not complete" })),
            )
                .into_response()
        }
    }
}

pub(crate) async fn archive_handler<R, S, N>(
    State(service): State<SharedService<R, S, N>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    S: ObjectStore + 'static,
    N: Notifier + 'static,
{
    match service.archive(&SessionId(session_id)) {
        Ok(archive) => {
            let headers = [
                (header::CONTENT_TYPE, "application/zip".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", archive.file_name),
                ),
            ];
            (StatusCode::OK, headers, archive.bytes).into_response()
        }
        Err(err) => error_response(err),
    }
}

fn validation_payload(error: &ValidationError) -> serde_json::Value {
    json!({
        "error": error.to_string(),
        "member_index": error.member_index,
        "missing": error
            .missing
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
    })
}

fn error_response(err: OnboardingServiceError) -> Response {
    let (status, payload) = match &err {
        OnboardingServiceError::Repository(RepositoryError::NotFound) => {
            (StatusCode::NOT_FOUND, json!({ "error": err.to_string() }))
        }
        OnboardingServiceError::ArchiveUnavailable => {
            (StatusCode::NOT_FOUND, json!({ "error": err.to_string() }))
        }
        OnboardingServiceError::Session(SessionError::Registry(registry)) => match registry {
            RegistryError::OutOfRange { .. } => {
                (StatusCode::NOT_FOUND, json!({ "error": err.to_string() }))
            }
            RegistryError::Validation(validation) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                validation_payload(validation),
            ),
            RegistryError::InvalidFamilySize | RegistryError::Update { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": err.to_string() }),
            ),
        },
        OnboardingServiceError::Session(SessionError::Closed { .. }) => {
            (StatusCode::CONFLICT, json!({ "error": err.to_string() }))
        }
        OnboardingServiceError::Submission(submission) => match submission {
            SubmissionError::Validation(validation) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                validation_payload(validation),
            ),
            SubmissionError::FamilyNotConfirmed => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": err.to_string() }),
            ),
            SubmissionError::AlreadySubmitted | SubmissionError::InvalidPhase(_) => {
                (StatusCode::CONFLICT, json!({ "error": err.to_string() }))
            }
            SubmissionError::Assembly(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": err.to_string() }),
            ),
        },
        OnboardingServiceError::Repository(RepositoryError::Conflict) => {
            (StatusCode::CONFLICT, json!({ "error": err.to_string() }))
        }
        OnboardingServiceError::Repository(RepositoryError::Unavailable(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": err.to_string() }),
        ),
    };

    (status, Json(payload)).into_response()
}
