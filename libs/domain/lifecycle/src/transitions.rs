//! The authoritative (from, to, actor) transition table (spec §4.G).

use dispatch_domain_models::{Actor, JobStatus};

/// Checks whether `actor` may move a job from `from` to `to`. The table is
/// the single source of truth; nothing outside this function may authorize
/// a status change.
pub fn is_allowed(from: JobStatus, to: JobStatus, actor: Actor) -> bool {
    use Actor::*;
    use JobStatus::*;

    match (from, to) {
        (Draft, PendingMatch) => matches!(actor, Customer | System),
        (Draft, CancelledByCustomer) => matches!(actor, Customer),

        (PendingMatch, Matched) => matches!(actor, System),
        (PendingMatch, CancelledByCustomer) => matches!(actor, Customer),
        (PendingMatch, CancelledBySystem) => matches!(actor, System | Admin),

        (Matched, PendingApproval) => matches!(actor, System | Provider),
        (Matched, PendingMatch) => matches!(actor, System),
        (Matched, CancelledByCustomer) => matches!(actor, Customer),

        (PendingApproval, Scheduled) => matches!(actor, Customer | System),
        (PendingApproval, ProviderAccepted) => matches!(actor, Customer),
        (PendingApproval, PendingMatch) => matches!(actor, Customer),
        (PendingApproval, CancelledByCustomer) => matches!(actor, Customer),

        (Scheduled, ProviderAccepted) => matches!(actor, System),
        (Scheduled, CancelledByCustomer | CancelledByProvider | CancelledBySystem) => true,

        (ProviderAccepted, ProviderEnRoute) => matches!(actor, Provider),
        // §4.I names provider_accepted as a reassign-eligible origin even
        // though the table in §4.G only enumerates provider_accepted's
        // other outbound edges; reassign always drives this one as System.
        (ProviderAccepted, PendingMatch) => matches!(actor, System),
        (ProviderAccepted, CancelledByProvider) => matches!(actor, Provider),
        (ProviderAccepted, CancelledByCustomer) => matches!(actor, Customer),

        (ProviderEnRoute, InProgress) => matches!(actor, Provider),
        (ProviderEnRoute, CancelledByProvider | CancelledBySystem) => matches!(actor, Provider | System),

        (InProgress, Completed) => matches!(actor, Provider),
        (InProgress, Disputed) => matches!(actor, Customer | Provider),

        (Completed, Refunded) => matches!(actor, Admin),
        (Completed, Disputed) => matches!(actor, Customer),

        _ => false,
    }
}

/// `Scheduled → cancelled_*` permits only the matching actor for the target
/// kind (the table above collapses it to "respective actor"); this refines
/// that case to exactly which cancellation an actor may perform.
pub fn scheduled_cancellation_actor_matches(to: JobStatus, actor: Actor) -> bool {
    matches!(
        (to, actor),
        (JobStatus::CancelledByCustomer, Actor::Customer)
            | (JobStatus::CancelledByProvider, Actor::Provider)
            | (JobStatus::CancelledBySystem, Actor::System | Actor::Admin)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_can_move_draft_to_pending_match() {
        assert!(is_allowed(JobStatus::Draft, JobStatus::PendingMatch, Actor::Customer));
    }

    #[test]
    fn provider_cannot_cancel_a_draft_job() {
        assert!(!is_allowed(JobStatus::Draft, JobStatus::CancelledByProvider, Actor::Provider));
    }

    #[test]
    fn unlisted_pair_is_rejected() {
        assert!(!is_allowed(JobStatus::Completed, JobStatus::PendingMatch, Actor::Admin));
    }

    #[test]
    fn scheduled_cancellation_actor_gate_rejects_mismatched_actor() {
        assert!(!scheduled_cancellation_actor_matches(
            JobStatus::CancelledByProvider,
            Actor::Customer
        ));
    }
}
