//! Maps the domain's [`CoreError`] taxonomy (spec §7) and the persistence
//! and collaborator error types onto HTTP status codes and a JSON body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dispatch_domain_models::CoreError;
use dispatch_infra_collaborators::CollaboratorError;
use dispatch_infra_db::DbError;
use serde_json::json;
use tracing::error;

pub struct ApiError(pub CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        let core = match err {
            DbError::JobNotFound => CoreError::not_found("job", "unknown"),
            DbError::AssignmentNotFound => CoreError::not_found("assignment", "unknown"),
            DbError::ProviderNotFound => CoreError::not_found("provider", "unknown"),
            DbError::TaskNotFound => CoreError::not_found("task", "unknown"),
            other => CoreError::Fatal { detail: other.to_string() },
        };
        Self(core)
    }
}

impl From<CollaboratorError> for ApiError {
    fn from(err: CollaboratorError) -> Self {
        let core = match err {
            CollaboratorError::Timeout => CoreError::ExternalTimeout { collaborator: "collaborator" },
            other => CoreError::Fatal { detail: other.to_string() },
        };
        Self(core)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self.0 {
            CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            CoreError::InvalidTransition { .. } => (StatusCode::CONFLICT, "invalid_transition"),
            CoreError::OfferNotFound { .. } => (StatusCode::NOT_FOUND, "offer_not_found"),
            CoreError::OfferAlreadyResponded { .. } => (StatusCode::CONFLICT, "offer_already_responded"),
            CoreError::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, "unauthorized"),
            CoreError::ValidationFailed { .. } => (StatusCode::BAD_REQUEST, "validation_failed"),
            CoreError::PricingUnavailable { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "pricing_unavailable"),
            CoreError::ExternalTimeout { .. } => (StatusCode::BAD_GATEWAY, "external_timeout"),
            CoreError::ConflictingState { .. } => (StatusCode::CONFLICT, "conflicting_state"),
            CoreError::Fatal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "fatal"),
        };

        // §7: a Fatal error is an invariant breach, not a request-shaped
        // failure — it gets an alert-worthy log line in addition to the
        // response the caller sees.
        if let CoreError::Fatal { detail } = &self.0 {
            error!(target: "invariant_breach", %detail, "fatal invariant breach");
        }

        (status, Json(json!({ "error": kind, "detail": self.0.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
