//! Domain events published on the in-process event bus (spec §4.L).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::job::{Actor, JobStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainEvent {
    JobCreated {
        job_id: Uuid,
        customer_id: Uuid,
        task_id: Uuid,
    },
    SlaSnapshotCaptured {
        job_id: Uuid,
        profile_id: Option<Uuid>,
    },
    JobStatusChanged {
        job_id: Uuid,
        old: JobStatus,
        new: JobStatus,
        actor: Actor,
    },
    JobCompleted {
        job_id: Uuid,
        completed_at: DateTime<Utc>,
    },
    JobCancelled {
        job_id: Uuid,
        reason: String,
        actor: Actor,
    },
    /// §4.I: fired once per offered assignment at broadcast time, routed to
    /// the provider's personal room — this is the `new_offer` notification
    /// named in §4.I, distinct from `ProviderAssigned` below which fires
    /// once the race actually resolves.
    OfferCreated {
        job_id: Uuid,
        provider_id: Uuid,
        assignment_id: Uuid,
    },
    ProviderAssigned {
        job_id: Uuid,
        provider_id: Uuid,
        assignment_id: Uuid,
    },
    ProviderReassigned {
        job_id: Uuid,
        previous_provider_id: Option<Uuid>,
        new_provider_id: Uuid,
        reason: String,
    },
    SlaWarning {
        job_id: Uuid,
        kind: SlaWarningKind,
        minutes_remaining: i64,
    },
    PenaltyApplied {
        provider_id: Uuid,
        points_deducted: i32,
        new_score: f64,
    },
    ScoreRecovered {
        provider_id: Uuid,
        points_restored: i32,
        new_score: f64,
    },
}

impl DomainEvent {
    /// The job room (`job_{job_id}`, spec §4.K) this event belongs to, if
    /// any — `PenaltyApplied`/`ScoreRecovered` aren't job-scoped.
    pub fn job_id(&self) -> Option<Uuid> {
        match self {
            DomainEvent::JobCreated { job_id, .. }
            | DomainEvent::SlaSnapshotCaptured { job_id, .. }
            | DomainEvent::JobStatusChanged { job_id, .. }
            | DomainEvent::JobCompleted { job_id, .. }
            | DomainEvent::JobCancelled { job_id, .. }
            | DomainEvent::OfferCreated { job_id, .. }
            | DomainEvent::ProviderAssigned { job_id, .. }
            | DomainEvent::ProviderReassigned { job_id, .. }
            | DomainEvent::SlaWarning { job_id, .. } => Some(*job_id),
            DomainEvent::PenaltyApplied { .. } | DomainEvent::ScoreRecovered { .. } => None,
        }
    }

    /// The provider whose personal room (`provider_{user_id}`, spec §4.K)
    /// should also receive this event, if it's provider-scoped.
    pub fn provider_id(&self) -> Option<Uuid> {
        match self {
            DomainEvent::OfferCreated { provider_id, .. }
            | DomainEvent::ProviderAssigned { provider_id, .. }
            | DomainEvent::PenaltyApplied { provider_id, .. }
            | DomainEvent::ScoreRecovered { provider_id, .. } => Some(*provider_id),
            DomainEvent::ProviderReassigned { new_provider_id, .. } => Some(*new_provider_id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlaWarningKind {
    Response,
    Arrival,
    Completion,
}
