use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, State},
    http::{header, request::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::{Actor, ActorRole, MatterAction, MatterId, Milestone};
use super::repository::{MatterRepository, ReminderScheduler, RepositoryError};
use super::service::{MatterService, MatterServiceError};
use super::status::TransitionError;
use crate::workflows::documents::{DocumentService, DocumentServiceError, GenerationError};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Shared state for the matter routes.
pub struct MatterState<R, S> {
    pub matters: Arc<MatterService<R, S>>,
    pub documents: Arc<DocumentService<R>>,
}

impl<R, S> Clone for MatterState<R, S> {
    fn clone(&self) -> Self {
        Self {
            matters: Arc::clone(&self.matters),
            documents: Arc::clone(&self.documents),
        }
    }
}

/// Router builder exposing the matter timeline, confirmations, corrections, and documents.
pub fn matter_router<R, S>(state: MatterState<R, S>) -> Router
where
    R: MatterRepository + 'static,
    S: ReminderScheduler + 'static,
{
    Router::new()
        .route(
            "/api/v1/matters/:matter_id/timeline",
            get(timeline_handler::<R, S>),
        )
        .route(
            "/api/v1/matters/:matter_id/actions",
            post(action_handler::<R, S>),
        )
        .route(
            "/api/v1/matters/:matter_id/corrections",
            post(correction_handler::<R, S>),
        )
        .route(
            "/api/v1/matters/:matter_id/estate",
            get(estate_handler::<R, S>),
        )
        .route(
            "/api/v1/matters/:matter_id/documents/:form",
            post(document_handler::<R, S>),
        )
        .with_state(state)
}

/// Identity forwarded by the upstream authentication proxy.
#[async_trait]
impl<T> FromRequestParts<T> for Actor
where
    T: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &T) -> Result<Self, Self::Rejection> {
        let header_value = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        let Some(user_id) = header_value(USER_ID_HEADER) else {
            return Err(error_response(
                StatusCode::UNAUTHORIZED,
                "missing authenticated user",
            ));
        };
        let role = match header_value(USER_ROLE_HEADER) {
            None => ActorRole::Client,
            Some(raw) => ActorRole::parse(raw).ok_or_else(|| {
                error_response(StatusCode::FORBIDDEN, "unrecognized user role")
            })?,
        };

        Ok(Actor {
            user_id: user_id.to_string(),
            role,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub action: MatterAction,
}

#[derive(Debug, Deserialize)]
pub struct CorrectionRequest {
    pub milestone: Milestone,
    /// `null` clears the milestone.
    pub value: Option<DateTime<Utc>>,
}

pub(crate) async fn timeline_handler<R, S>(
    State(state): State<MatterState<R, S>>,
    Path(matter_id): Path<String>,
    _actor: Actor,
) -> Response
where
    R: MatterRepository + 'static,
    S: ReminderScheduler + 'static,
{
    match state.matters.timeline(&MatterId(matter_id), Utc::now()) {
        Ok(timeline) => (StatusCode::OK, Json(timeline)).into_response(),
        Err(err) => matter_error_response(err),
    }
}

pub(crate) async fn action_handler<R, S>(
    State(state): State<MatterState<R, S>>,
    Path(matter_id): Path<String>,
    actor: Actor,
    Json(request): Json<ActionRequest>,
) -> Response
where
    R: MatterRepository + 'static,
    S: ReminderScheduler + 'static,
{
    match state
        .matters
        .perform(&MatterId(matter_id), request.action, &actor, Utc::now())
    {
        Ok(timeline) => (StatusCode::OK, Json(timeline)).into_response(),
        Err(err) => matter_error_response(err),
    }
}

pub(crate) async fn correction_handler<R, S>(
    State(state): State<MatterState<R, S>>,
    Path(matter_id): Path<String>,
    actor: Actor,
    Json(request): Json<CorrectionRequest>,
) -> Response
where
    R: MatterRepository + 'static,
    S: ReminderScheduler + 'static,
{
    match state.matters.correct(
        &MatterId(matter_id),
        request.milestone,
        request.value,
        &actor,
        Utc::now(),
    ) {
        Ok(timeline) => (StatusCode::OK, Json(timeline)).into_response(),
        Err(err) => matter_error_response(err),
    }
}

pub(crate) async fn estate_handler<R, S>(
    State(state): State<MatterState<R, S>>,
    Path(matter_id): Path<String>,
    _actor: Actor,
) -> Response
where
    R: MatterRepository + 'static,
    S: ReminderScheduler + 'static,
{
    match state.documents.review(&MatterId(matter_id)) {
        Ok(review) => (StatusCode::OK, Json(review)).into_response(),
        Err(err) => document_error_response(err),
    }
}

pub(crate) async fn document_handler<R, S>(
    State(state): State<MatterState<R, S>>,
    Path((matter_id, form)): Path<(String, String)>,
    _actor: Actor,
) -> Response
where
    R: MatterRepository + 'static,
    S: ReminderScheduler + 'static,
{
    let documents = Arc::clone(&state.documents);
    let today = Utc::now().date_naive();
    let generated = tokio::task::spawn_blocking(move || {
        documents.generate(&MatterId(matter_id), &form, today)
    })
    .await;

    let result = match generated {
        Ok(result) => result,
        Err(join_error) => {
            error!(error = %join_error, "document generation task failed");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "document generation failed, please retry",
            );
        }
    };

    match result {
        Ok(document) => {
            let disposition = format!("attachment; filename=\"{}\"", document.file_name);
            let mut response = (StatusCode::OK, document.bytes).into_response();
            let headers = response.headers_mut();
            if let Ok(value) = HeaderValue::from_str(document.content_type.as_ref()) {
                headers.insert(header::CONTENT_TYPE, value);
            }
            if let Ok(value) = HeaderValue::from_str(&disposition) {
                headers.insert(header::CONTENT_DISPOSITION, value);
            }
            headers.insert(
                "x-validation-warnings",
                HeaderValue::from(document.warnings.len()),
            );
            response
        }
        Err(err) => document_error_response(err),
    }
}

fn matter_error_response(err: MatterServiceError) -> Response {
    match err {
        MatterServiceError::Transition(
            transition @ TransitionError::WaitingPeriodActive {
                days_remaining,
                earliest_filing_date,
            },
        ) => {
            let payload = json!({
                "error": transition.to_string(),
                "days_remaining": days_remaining,
                "earliest_filing_date": earliest_filing_date,
            });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        MatterServiceError::Transition(transition) => {
            error_response(StatusCode::CONFLICT, &transition.to_string())
        }
        MatterServiceError::Forbidden => {
            error_response(StatusCode::FORBIDDEN, &MatterServiceError::Forbidden.to_string())
        }
        MatterServiceError::Repository(repository) => repository_error_response(repository),
    }
}

fn document_error_response(err: DocumentServiceError) -> Response {
    match err {
        DocumentServiceError::Repository(repository) => repository_error_response(repository),
        DocumentServiceError::Generation(GenerationError::NotAvailable { form }) => {
            let payload = json!({ "status": "not_available", "form": form });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        DocumentServiceError::Generation(GenerationError::Invalid { errors }) => {
            let payload = json!({
                "error": "estate data is incomplete",
                "errors": errors,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        DocumentServiceError::Generation(other) => {
            error!(error = %other, "document generation failed");
            error_response(
                StatusCode::BAD_GATEWAY,
                "document generation failed, please retry",
            )
        }
    }
}

fn repository_error_response(err: RepositoryError) -> Response {
    match err {
        RepositoryError::NotFound => error_response(StatusCode::NOT_FOUND, "matter not found"),
        RepositoryError::Conflict => error_response(StatusCode::CONFLICT, &err.to_string()),
        RepositoryError::Stale => error_response(
            StatusCode::CONFLICT,
            "the matter was updated by someone else, please reload and retry",
        ),
        RepositoryError::Unavailable(detail) => {
            error!(error = %detail, "matter repository unavailable");
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "the matter could not be saved, please retry",
            )
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
