//! Background daemons named in §5's scheduling model: offer-expiry sweep,
//! SLA warning scan, weekly score recovery, credential/insurance expiry
//! scan. Each runs on its own interval for the lifetime of the process.

use std::time::Duration;

use chrono::Utc;
use dispatch_domain_models::{Actor, DomainEvent, JobStatus, PenaltyType, ProviderStatus};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::handlers::operations::broadcast_matching_offers;
use crate::services::scoring::apply_penalty;
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn run_offer_expiry_sweeper(state: AppState, interval_secs: u64) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    loop {
        ticker.tick().await;
        if let Err(e) = sweep_offer_expiry(&state).await {
            error!(error = %e, "offer expiry sweep failed");
        }
    }
}

/// One pass: flips every overdue offer to `expired`, penalizes the
/// providers who let it lapse, and re-broadcasts any job left with nothing
/// but terminal assignments.
pub async fn sweep_offer_expiry(state: &AppState) -> Result<usize, dispatch_infra_db::DbError> {
    let expired = state.assignments.expire_overdue_offers().await?;
    if expired.is_empty() {
        return Ok(0);
    }

    info!(count = expired.len(), "expired overdue offers");
    let mut affected_jobs: Vec<Uuid> = Vec::new();
    for assignment in &expired {
        if let Err(e) = apply_penalty(
            state,
            assignment.provider_id,
            Some(assignment.job_id),
            PenaltyType::ResponseTimeout,
            Some("offer expired without a response".into()),
            Utc::now(),
        )
        .await
        {
            error!(error = %e, assignment_id = %assignment.id, "failed to penalize response timeout");
        }
        if !affected_jobs.contains(&assignment.job_id) {
            affected_jobs.push(assignment.job_id);
        }
    }
    for job_id in affected_jobs {
        if let Err(e) = rebroadcast_if_fully_expired(state, job_id).await {
            error!(error = %e, %job_id, "failed to re-broadcast after offer expiry");
        }
    }
    Ok(expired.len())
}

/// §8 scenario 5: once every offer on a job has gone terminal (all expired,
/// none accepted), the job falls back to `pending_match` and a fresh round
/// goes out, picking up any provider who came online since the first
/// broadcast.
async fn rebroadcast_if_fully_expired(state: &AppState, job_id: Uuid) -> Result<(), dispatch_infra_db::DbError> {
    let assignments = state.assignments.list_for_job(job_id).await?;
    if assignments.is_empty() || !assignments.iter().all(|a| a.status.is_terminal()) {
        return Ok(());
    }

    let mut job = state.jobs.get(job_id).await?;
    if job.status != JobStatus::Matched {
        return Ok(());
    }

    if dispatch_domain_lifecycle::transition(&mut job, JobStatus::PendingMatch, Actor::System, None).is_ok() {
        state.jobs.save_transition(&job).await?;
        let task = state.tasks.get(job.task_id).await?;
        if let Err(e) = broadcast_matching_offers(state, &job, task.required_level, Utc::now()).await {
            warn!(%job_id, detail = %e.0, "re-broadcast after offer expiry failed");
        }
    }
    Ok(())
}

/// Weekly recovery per §4.J: every provider with room below their level's
/// base score recovers `min(5, base - current)` once seven days have
/// elapsed since their last penalty.
#[instrument(skip(state))]
pub async fn run_weekly_score_recovery(state: AppState) {
    let mut ticker = tokio::time::interval(Duration::from_secs(24 * 60 * 60));
    loop {
        ticker.tick().await;
        if let Err(e) = sweep_score_recovery(&state).await {
            error!(error = %e, "weekly score recovery sweep failed");
        }
    }
}

pub async fn sweep_score_recovery(state: &AppState) -> Result<(), dispatch_infra_db::DbError> {
    let providers = state.providers.list_all().await?;
    let now = Utc::now();
    let mut recovered = 0u32;

    for provider in providers {
        let last_penalty_at = state
            .penalties
            .most_recent_for(provider.id)
            .await?
            .map(|record| record.applied_at);

        let Some(outcome) = dispatch_domain_scoring::recover(
            provider.id,
            provider.level,
            provider.internal_score,
            last_penalty_at,
            now,
        ) else {
            continue;
        };

        state
            .providers
            .update_score(provider.id, outcome.new_score, provider.status)
            .await?;
        state.penalties.insert(&outcome.record).await?;
        state.event_bus.publish(DomainEvent::ScoreRecovered {
            provider_id: provider.id,
            points_restored: -outcome.record.points_deducted,
            new_score: outcome.new_score,
        });
        recovered += 1;
    }

    if recovered > 0 {
        info!(recovered, "weekly score recovery applied");
    }
    Ok(())
}

/// Cascades provider suspension when a mandatory credential or insurance
/// policy lapses: L3+ requires a valid license and insurance, L4 also
/// requires an active on-call shift (spec §8 scenario 6, `original_source`'s
/// verification-service expiry scan). The credential/insurance rows
/// themselves are left for the issuing admin operation to flip to
/// `expired`; this pass only enforces the suspension consequence.
#[instrument(skip(state))]
pub async fn run_credential_expiry_scan(state: AppState) {
    let mut ticker = tokio::time::interval(Duration::from_secs(60 * 60));
    loop {
        ticker.tick().await;
        if let Err(e) = sweep_credential_expiry(&state).await {
            error!(error = %e, "credential expiry scan failed");
        }
    }
}

pub async fn sweep_credential_expiry(state: &AppState) -> Result<(), dispatch_infra_db::DbError> {
    use dispatch_domain_models::Level;

    let today = Utc::now().date_naive();
    let mut suspended = 0u32;

    for provider in state.providers.list_all().await? {
        if provider.level < Level::L3 || provider.status != ProviderStatus::Active {
            continue;
        }

        let credentials = state.providers.credentials_for(provider.id).await?;
        let has_license = credentials.iter().any(|c| c.is_valid_license_on(today));

        let insurance = state.providers.insurance_for(provider.id).await?;
        let has_insurance = insurance.iter().any(|i| i.is_active_on(today));

        let still_qualified = if provider.level == Level::L4 {
            let shifts = state.providers.on_call_shifts_for(provider.id).await?;
            has_license && has_insurance && shifts.iter().any(|s| s.covers(Utc::now()))
        } else {
            has_license && has_insurance
        };

        if !still_qualified {
            state
                .providers
                .update_score(provider.id, provider.internal_score, ProviderStatus::Suspended)
                .await?;
            warn!(provider_id = %provider.id, "provider suspended: mandatory credential lapsed");
            suspended += 1;
        }
    }

    if suspended > 0 {
        info!(suspended, "credential expiry scan suspended providers");
    }
    Ok(())
}

/// Emits an `SlaWarning` event once a deadline is within the configured
/// threshold, so notification transport (out of scope) or the realtime
/// socket can surface it.
#[instrument(skip(state))]
pub async fn run_sla_warning_scanner(state: AppState, threshold_min: i64) {
    let mut ticker = tokio::time::interval(Duration::from_secs(30));
    loop {
        ticker.tick().await;
        if let Err(e) = sweep_sla_warnings(&state, threshold_min).await {
            error!(error = %e, "SLA warning scan failed");
        }
    }
}

pub async fn sweep_sla_warnings(state: &AppState, threshold_min: i64) -> Result<(), dispatch_infra_db::DbError> {
    use dispatch_domain_lifecycle::sla_timers::check_warning;
    use dispatch_domain_models::SlaWarningKind;

    let now = Utc::now();
    let mut warned = 0u32;

    for assignment in state.assignments.list_active_with_deadlines().await? {
        if assignment.sla_arrival_met.is_none() {
            let arrival_overdue = assignment
                .sla_arrival_deadline
                .is_some_and(|deadline| assignment.arrived_at.is_none() && now > deadline);

            if arrival_overdue {
                // §4.J no_show: the provider accepted but never showed up by
                // the arrival deadline. Stamp the deadline as missed so this
                // assignment doesn't get penalized again on the next pass.
                state
                    .assignments
                    .record_arrival(assignment.id, assignment.sla_arrival_deadline.unwrap(), Some(false))
                    .await?;
                if let Err(e) = apply_penalty(
                    state,
                    assignment.provider_id,
                    Some(assignment.job_id),
                    PenaltyType::NoShow,
                    Some("provider never arrived by the SLA arrival deadline".into()),
                    now,
                )
                .await
                {
                    error!(error = %e, assignment_id = %assignment.id, "failed to penalize no-show");
                }
                continue;
            }

            if let Some((kind, minutes_remaining)) =
                check_warning(SlaWarningKind::Arrival, assignment.sla_arrival_deadline, now, threshold_min)
            {
                state.event_bus.publish(DomainEvent::SlaWarning {
                    job_id: assignment.job_id,
                    kind,
                    minutes_remaining,
                });
                warned += 1;
            }
        }
        if assignment.sla_completion_met.is_none() {
            if let Some((kind, minutes_remaining)) =
                check_warning(SlaWarningKind::Completion, assignment.sla_completion_deadline, now, threshold_min)
            {
                state.event_bus.publish(DomainEvent::SlaWarning {
                    job_id: assignment.job_id,
                    kind,
                    minutes_remaining,
                });
                warned += 1;
            }
        }
    }

    if warned > 0 {
        info!(warned, "SLA warnings emitted");
    }
    Ok(())
}

pub fn publish_job_completed(state: &AppState, job_id: uuid::Uuid) {
    state.event_bus.publish(DomainEvent::JobCompleted {
        job_id,
        completed_at: Utc::now(),
    });
}
