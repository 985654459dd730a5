//! SLA deadline computation and warning detection (spec §4.H). The snapshot
//! captured at job creation is the sole source of truth; nothing here
//! re-reads the live catalog.

use chrono::{DateTime, Duration, Utc};
use dispatch_domain_models::{Assignment, SlaSnapshot, SlaWarningKind};

/// Default per-kind minutes-remaining threshold for an `SlaWarning` event
/// when no process configuration overrides it.
pub const DEFAULT_WARNING_THRESHOLD_MIN: i64 = 5;

pub fn response_deadline(snapshot: &SlaSnapshot, offered_at: DateTime<Utc>, default_response_min: i32) -> DateTime<Utc> {
    let minutes = snapshot.response_time_min.unwrap_or(default_response_min);
    offered_at + Duration::minutes(minutes as i64)
}

pub fn arrival_deadline(snapshot: &SlaSnapshot, accepted_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    snapshot.arrival_time_min.map(|minutes| accepted_at + Duration::minutes(minutes as i64))
}

pub fn completion_deadline(snapshot: &SlaSnapshot, en_route_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    snapshot
        .completion_time_min
        .map(|minutes| en_route_at + Duration::minutes(minutes as i64))
}

/// Marks `sla_response_met` when the provider's acceptance lands at or
/// before the response deadline.
pub fn mark_response(assignment: &mut Assignment, responded_at: DateTime<Utc>) {
    assignment.sla_response_met = Some(responded_at <= assignment.sla_response_deadline);
}

/// Marks `sla_arrival_met` when the provider's en-route transition lands at
/// or before the arrival deadline, if one exists.
pub fn mark_arrival(assignment: &mut Assignment, en_route_at: DateTime<Utc>) {
    if let Some(deadline) = assignment.sla_arrival_deadline {
        assignment.sla_arrival_met = Some(en_route_at <= deadline);
    }
}

/// Marks `sla_completion_met` when job completion lands at or before the
/// completion deadline, if one exists.
pub fn mark_completion(assignment: &mut Assignment, completed_at: DateTime<Utc>) {
    if let Some(deadline) = assignment.sla_completion_deadline {
        assignment.sla_completion_met = Some(completed_at <= deadline);
    }
}

/// Checks one (kind, deadline) pair against `now` and returns the minutes
/// remaining if it falls within the warning threshold and hasn't passed.
pub fn check_warning(
    kind: SlaWarningKind,
    deadline: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    threshold_min: i64,
) -> Option<(SlaWarningKind, i64)> {
    let deadline = deadline?;
    let minutes_remaining = (deadline - now).num_minutes();
    (minutes_remaining >= 0 && minutes_remaining <= threshold_min).then_some((kind, minutes_remaining))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> SlaSnapshot {
        SlaSnapshot {
            profile_id: None,
            response_time_min: Some(30),
            arrival_time_min: Some(60),
            completion_time_min: Some(240),
            penalty_per_min_cents: None,
            penalty_cap_cents: None,
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn response_deadline_uses_snapshot_minutes() {
        let now = Utc::now();
        let deadline = response_deadline(&snapshot(), now, 45);
        assert_eq!(deadline, now + Duration::minutes(30));
    }

    #[test]
    fn warning_fires_within_threshold() {
        let now = Utc::now();
        let deadline = now + Duration::minutes(3);
        let warning = check_warning(SlaWarningKind::Arrival, Some(deadline), now, 5);
        assert_eq!(warning, Some((SlaWarningKind::Arrival, 3)));
    }

    #[test]
    fn warning_does_not_fire_when_far_out() {
        let now = Utc::now();
        let deadline = now + Duration::minutes(30);
        assert!(check_warning(SlaWarningKind::Arrival, Some(deadline), now, 5).is_none());
    }

    #[test]
    fn warning_does_not_fire_after_deadline_passed() {
        let now = Utc::now();
        let deadline = now - Duration::minutes(1);
        assert!(check_warning(SlaWarningKind::Response, Some(deadline), now, 5).is_none());
    }
}
