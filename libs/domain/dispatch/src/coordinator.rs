//! Assignment coordinator: broadcast offers, first-acceptance-wins accept,
//! decline, expiry sweep, and reassignment (spec §4.I).
//!
//! These functions operate on one job's already-locked assignment set; the
//! caller (the infra repository layer) is responsible for the row lock or
//! conditional update that makes the whole operation atomic with respect to
//! concurrent accepts on the same job.

use chrono::{DateTime, Duration, Utc};
use dispatch_domain_matching::RankedCandidate;
use dispatch_domain_models::{Assignment, AssignmentStatus, CoreError, CoreResult, DomainEvent, Job, JobStatus};
use uuid::Uuid;

pub const DEFAULT_RESPONSE_MIN: i32 = 30;

/// Builds one `offered` Assignment per ranked candidate. The job is
/// expected to already be in `pending_match`; transitioning it there is the
/// lifecycle state machine's job, not this function's.
pub fn broadcast(
    job_id: Uuid,
    candidates: Vec<RankedCandidate>,
    response_time_min: Option<i32>,
    now: DateTime<Utc>,
) -> Vec<Assignment> {
    let response_min = response_time_min.unwrap_or(DEFAULT_RESPONSE_MIN);
    let offer_expires_at = now + Duration::minutes(response_min as i64);

    candidates
        .into_iter()
        .map(|ranked| Assignment {
            id: Uuid::new_v4(),
            job_id,
            provider_id: ranked.candidate.provider_id,
            status: AssignmentStatus::Offered,
            offered_at: now,
            offer_expires_at,
            responded_at: None,
            decline_reason: None,
            sla_response_deadline: offer_expires_at,
            sla_arrival_deadline: None,
            sla_completion_deadline: None,
            sla_response_met: None,
            sla_arrival_met: None,
            sla_completion_met: None,
            en_route_at: None,
            arrived_at: None,
            started_work_at: None,
            completed_at: None,
            match_score: ranked.composite_score,
        })
        .collect()
}

pub struct AcceptOutcome {
    pub events: Vec<DomainEvent>,
    pub job_transitioned: bool,
}

/// Applies the first-acceptance-wins accept for `provider_id` against every
/// assignment currently attached to `job`. Mutates the winning assignment to
/// `accepted`, every other still-`offered` assignment to `declined`, and
/// (if eligible) the job to `pending_approval`.
pub fn accept(
    job: &mut Job,
    assignments: &mut [Assignment],
    provider_id: Uuid,
    now: DateTime<Utc>,
) -> CoreResult<AcceptOutcome> {
    let winner_idx = assignments
        .iter()
        .position(|a| a.provider_id == provider_id)
        .ok_or(CoreError::OfferNotFound {
            job_id: job.id,
            provider_id,
        })?;

    if assignments[winner_idx].status != AssignmentStatus::Offered {
        return Err(CoreError::OfferAlreadyResponded {
            job_id: job.id,
            provider_id,
        });
    }

    assignments[winner_idx].status = AssignmentStatus::Accepted;
    assignments[winner_idx].responded_at = Some(now);
    assignments[winner_idx].sla_response_met = Some(now <= assignments[winner_idx].sla_response_deadline);
    assignments[winner_idx].sla_arrival_deadline =
        job.sla_snapshot.arrival_time_min.map(|min| now + Duration::minutes(min as i64));

    let mut events = vec![DomainEvent::ProviderAssigned {
        job_id: job.id,
        provider_id,
        assignment_id: assignments[winner_idx].id,
    }];

    for (idx, assignment) in assignments.iter_mut().enumerate() {
        if idx != winner_idx && assignment.status == AssignmentStatus::Offered {
            assignment.status = AssignmentStatus::Declined;
            assignment.responded_at = Some(now);
            assignment.decline_reason = Some("lost the race".into());
        }
    }

    let job_transitioned = matches!(job.status, JobStatus::Matched | JobStatus::PendingMatch);
    if job_transitioned {
        let old = job.status;
        job.status = JobStatus::PendingApproval;
        events.push(DomainEvent::JobStatusChanged {
            job_id: job.id,
            old,
            new: JobStatus::PendingApproval,
            actor: dispatch_domain_models::Actor::Provider,
        });
    }

    Ok(AcceptOutcome {
        events,
        job_transitioned,
    })
}

/// Marks the caller's own assignment `declined`. Returns `true` when every
/// outstanding offer on the job is now terminal (caller should return the
/// job to `pending_match` for re-broadcast).
pub fn decline(
    assignments: &mut [Assignment],
    provider_id: Uuid,
    job_id: Uuid,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> CoreResult<bool> {
    let idx = assignments
        .iter()
        .position(|a| a.provider_id == provider_id)
        .ok_or(CoreError::OfferNotFound { job_id, provider_id })?;

    if assignments[idx].status != AssignmentStatus::Offered {
        return Err(CoreError::OfferAlreadyResponded { job_id, provider_id });
    }

    assignments[idx].status = AssignmentStatus::Declined;
    assignments[idx].responded_at = Some(now);
    assignments[idx].decline_reason = reason;

    Ok(all_terminal(assignments))
}

/// Transitions every `offered` assignment whose `offer_expires_at` has
/// passed to `expired`. Returns `true` when no active offers remain.
pub fn sweep_expired(assignments: &mut [Assignment], now: DateTime<Utc>) -> bool {
    for assignment in assignments.iter_mut() {
        if assignment.status == AssignmentStatus::Offered && assignment.offer_expires_at <= now {
            assignment.status = AssignmentStatus::Expired;
        }
    }
    all_terminal(assignments)
}

/// Cancels the current accepted/offered assignments ahead of a reassignment,
/// recording `decline_reason` on each. The caller is expected to then reset
/// the job to `pending_match` (when it was `matched`/`provider_accepted`)
/// and re-run broadcast for the new candidate.
pub fn reassign_cancel_current(assignments: &mut [Assignment], reason: &str, now: DateTime<Utc>) {
    for assignment in assignments.iter_mut() {
        if matches!(assignment.status, AssignmentStatus::Offered | AssignmentStatus::Accepted) {
            assignment.status = AssignmentStatus::Cancelled;
            assignment.responded_at = Some(now);
            assignment.decline_reason = Some(reason.to_string());
        }
    }
}

fn all_terminal(assignments: &[Assignment]) -> bool {
    assignments.iter().all(|a| a.status.is_terminal())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_domain_models::{Priority, ServiceAddress, SlaSnapshot};

    fn fixture_job(status: JobStatus) -> Job {
        Job {
            id: Uuid::new_v4(),
            reference: "JOB-0001".into(),
            customer_id: Uuid::new_v4(),
            task_id: Uuid::new_v4(),
            status,
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

    fn fixture_offer(job_id: Uuid, provider_id: Uuid, now: DateTime<Utc>) -> Assignment {
        Assignment {
            id: Uuid::new_v4(),
            job_id,
            provider_id,
            status: AssignmentStatus::Offered,
            offered_at: now,
            offer_expires_at: now + Duration::minutes(30),
            responded_at: None,
            decline_reason: None,
            sla_response_deadline: now + Duration::minutes(30),
            sla_arrival_deadline: None,
            sla_completion_deadline: None,
            sla_response_met: None,
            sla_arrival_met: None,
            sla_completion_met: None,
            en_route_at: None,
            arrived_at: None,
            started_work_at: None,
            completed_at: None,
            match_score: 0.8,
        }
    }

    #[test]
    fn broadcast_race_exactly_one_winner() {
        let now = Utc::now();
        let mut job = fixture_job(JobStatus::Matched);
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        let p3 = Uuid::new_v4();
        let mut assignments = vec![
            fixture_offer(job.id, p1, now),
            fixture_offer(job.id, p2, now),
            fixture_offer(job.id, p3, now),
        ];

        let outcome = accept(&mut job, &mut assignments, p1, now).unwrap();
        assert!(outcome.job_transitioned);
        assert_eq!(job.status, JobStatus::PendingApproval);

        let second = accept(&mut job, &mut assignments, p2, now);
        assert!(matches!(second, Err(CoreError::OfferAlreadyResponded { .. })));

        assert_eq!(assignments[0].status, AssignmentStatus::Accepted);
        assert_eq!(assignments[1].status, AssignmentStatus::Declined);
        assert_eq!(assignments[2].status, AssignmentStatus::Declined);
    }

    #[test]
    fn expiry_sweep_flips_overdue_offers() {
        let offered_at = Utc::now() - Duration::minutes(40);
        let job_id = Uuid::new_v4();
        let mut assignments = vec![fixture_offer(job_id, Uuid::new_v4(), offered_at)];
        let all_terminal = sweep_expired(&mut assignments, Utc::now());
        assert_eq!(assignments[0].status, AssignmentStatus::Expired);
        assert!(all_terminal);
    }

    #[test]
    fn decline_returns_false_while_siblings_still_offered() {
        let now = Utc::now();
        let job_id = Uuid::new_v4();
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        let mut assignments = vec![fixture_offer(job_id, p1, now), fixture_offer(job_id, p2, now)];
        let all_terminal = decline(&mut assignments, p1, job_id, Some("busy".into()), now).unwrap();
        assert!(!all_terminal);
        assert_eq!(assignments[0].status, AssignmentStatus::Declined);
    }
}
