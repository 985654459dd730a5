//! Wires the scoring ledger (spec §4.J) to the infraction sources named in
//! §2's data flow: response timeouts and no-shows from the dispatch
//! sweepers, cancellations and bad reviews from the handler layer.

use chrono::{DateTime, Utc};
use dispatch_domain_models::{DomainEvent, PenaltyType, ProviderStatus};
use tracing::instrument;
use uuid::Uuid;

use crate::state::AppState;

/// Looks up the provider's current level/score, runs the ledger, persists
/// the new score/status and the audit row, and publishes `PenaltyApplied`.
#[instrument(skip(state, reason))]
pub async fn apply_penalty(
    state: &AppState,
    provider_id: Uuid,
    job_id: Option<Uuid>,
    penalty_type: PenaltyType,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), dispatch_infra_db::DbError> {
    let provider = state.providers.get(provider_id).await?;
    let outcome = dispatch_domain_scoring::penalize(
        provider_id,
        provider.level,
        provider.internal_score,
        penalty_type,
        job_id,
        reason,
        now,
    );

    let status = if outcome.suspend { ProviderStatus::Suspended } else { provider.status };
    state.providers.update_score(provider_id, outcome.new_score, status).await?;
    state.penalties.insert(&outcome.record).await?;
    state.event_bus.publish(DomainEvent::PenaltyApplied {
        provider_id,
        points_deducted: outcome.record.points_deducted,
        new_score: outcome.new_score,
    });
    Ok(())
}
