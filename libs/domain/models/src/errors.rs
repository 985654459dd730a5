//! Error taxonomy shared across every dispatch-core component (spec §7).

use thiserror::Error;
use uuid::Uuid;

/// The closed set of error kinds the core can surface. Each variant maps to
/// exactly one row in the taxonomy table; never add ad-hoc string errors at
/// the component boundary, wrap them in one of these instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("transition from {from} to {to} by {actor:?} is not permitted")]
    InvalidTransition {
        from: String,
        to: String,
        actor: String,
    },

    #[error("no offer found for job {job_id} / provider {provider_id}")]
    OfferNotFound { job_id: Uuid, provider_id: Uuid },

    #[error("offer for job {job_id} / provider {provider_id} already responded to")]
    OfferAlreadyResponded { job_id: Uuid, provider_id: Uuid },

    #[error("actor is not authorized to perform this action: {reason}")]
    Unauthorized { reason: String },

    #[error("validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("pricing unavailable for task {task_id}: {reason}")]
    PricingUnavailable { task_id: Uuid, reason: String },

    #[error("external collaborator timed out: {collaborator}")]
    ExternalTimeout { collaborator: &'static str },

    #[error("concurrent writer won the race, retry: {detail}")]
    ConflictingState { detail: String },

    #[error("invariant breach: {detail}")]
    Fatal { detail: String },
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// `ConflictingState` is the only kind §7 marks retry-safe for idempotent
    /// operations; the caller decides whether to actually retry.
    pub fn is_retry_safe(&self) -> bool {
        matches!(self, Self::ConflictingState { .. })
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
