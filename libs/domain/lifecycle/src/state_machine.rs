//! Applies a validated job status transition and its side effects: the
//! timestamp writes and the `JobStatusChanged` event (spec §4.G).

use chrono::Utc;
use dispatch_domain_models::{Actor, CoreError, CoreResult, DomainEvent, Job, JobStatus};

use crate::transitions;

/// The result of a successful transition: the event to publish. Callers
/// persist `job` (already mutated) and emit `event` on the bus within the
/// same transaction.
pub struct TransitionOutcome {
    pub event: DomainEvent,
}

/// Validates and applies `job.status -> to` as `actor`. Mutates `job` in
/// place (status plus the relevant timestamp/reason fields) and returns the
/// event to publish. Fails with `InvalidTransition` when the pair is not in
/// the authoritative table, or when `Scheduled -> cancelled_*` names a
/// cancellation kind the actor isn't allowed to perform.
pub fn transition(
    job: &mut Job,
    to: JobStatus,
    actor: Actor,
    cancellation_reason: Option<String>,
) -> CoreResult<TransitionOutcome> {
    let from = job.status;

    if !transitions::is_allowed(from, to, actor) {
        return Err(CoreError::InvalidTransition {
            from: format!("{from:?}"),
            to: format!("{to:?}"),
            actor: format!("{actor:?}"),
        });
    }

    if from == JobStatus::Scheduled
        && matches!(
            to,
            JobStatus::CancelledByCustomer | JobStatus::CancelledByProvider | JobStatus::CancelledBySystem
        )
        && !transitions::scheduled_cancellation_actor_matches(to, actor)
    {
        return Err(CoreError::InvalidTransition {
            from: format!("{from:?}"),
            to: format!("{to:?}"),
            actor: format!("{actor:?}"),
        });
    }

    let now = Utc::now();
    job.status = to;

    if to == JobStatus::InProgress {
        job.started_at = Some(now);
    }
    if to == JobStatus::Completed {
        job.completed_at = Some(now);
    }
    if to.is_terminal() && to != JobStatus::Completed && to != JobStatus::Refunded {
        job.cancelled_at = Some(now);
        job.cancellation_reason = cancellation_reason;
    }

    Ok(TransitionOutcome {
        event: DomainEvent::JobStatusChanged {
            job_id: job.id,
            old: from,
            new: to,
            actor,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_domain_models::{Priority, ServiceAddress, SlaSnapshot};
    use uuid::Uuid;

    fn fixture_job() -> Job {
        Job {
            id: Uuid::new_v4(),
            reference: "JOB-0001".into(),
            customer_id: Uuid::new_v4(),
            task_id: Uuid::new_v4(),
            status: JobStatus::Draft,
            priority: Priority::Standard,
            is_emergency: false,
            service_lat: 43.65,
            service_lng: -79.38,
            service_address: ServiceAddress {
                line1: "1 Main St".into(),
                line2: None,
                city: "Toronto".into(),
                region: "ON".into(),
                postal_code: "M5V 0A1".into(),
                country: "CA".into(),
            },
            requested_date: None,
            requested_time_start: None,
            requested_time_end: None,
            flexible_schedule: true,
            sla_snapshot: SlaSnapshot::degraded(Utc::now()),
            quoted_price_cents: 3500,
            commission_rate: rust_decimal::Decimal::new(175, 3),
            commission_cents: 0,
            provider_payout_cents: 0,
            currency: "CAD".into(),
            customer_notes: vec![],
            started_at: None,
            completed_at: None,
            cancelled_at: None,
            cancellation_reason: None,
        }
    }

    #[test]
    fn valid_transition_updates_status_and_emits_event() {
        let mut job = fixture_job();
        let outcome = transition(&mut job, JobStatus::PendingMatch, Actor::Customer, None).unwrap();
        assert_eq!(job.status, JobStatus::PendingMatch);
        assert!(matches!(outcome.event, DomainEvent::JobStatusChanged { .. }));
    }

    #[test]
    fn cancellation_writes_timestamp_and_reason() {
        let mut job = fixture_job();
        transition(
            &mut job,
            JobStatus::CancelledByCustomer,
            Actor::Customer,
            Some("changed my mind".into()),
        )
        .unwrap();
        assert!(job.cancelled_at.is_some());
        assert_eq!(job.cancellation_reason.as_deref(), Some("changed my mind"));
    }

    #[test]
    fn invalid_transition_is_rejected_and_job_unchanged() {
        let mut job = fixture_job();
        let err = transition(&mut job, JobStatus::Completed, Actor::Provider, None).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
        assert_eq!(job.status, JobStatus::Draft);
    }
}
