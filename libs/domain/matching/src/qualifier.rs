//! Hard-qualification gate (spec §4.D). Every check is a silent drop: a
//! candidate that fails any step never reaches the ranking stage and the
//! caller is never told why.

use chrono::{DateTime, NaiveDate, Utc};
use dispatch_domain_models::{
    Credential, InsurancePolicy, Level, OnCallShift, ProviderProfile, LEVEL_4_MIN_COVERAGE_CENTS,
};
use uuid::Uuid;

use crate::geo;

/// Everything the qualifier needs to know about one candidate beyond their
/// profile row. Callers load this per-provider before calling [`qualify`].
pub struct CandidateRecords<'a> {
    pub profile: &'a ProviderProfile,
    pub task_qualified: bool,
    pub credentials: &'a [Credential],
    pub insurance_policies: &'a [InsurancePolicy],
    pub on_call_shifts: &'a [OnCallShift],
}

/// A candidate that has passed every hard filter, enriched with the facts
/// the ranking stage and the caller need.
#[derive(Debug, Clone)]
pub struct QualifiedCandidate {
    pub provider_id: Uuid,
    pub distance_km: f64,
    pub has_license: bool,
    pub has_insurance: bool,
    pub on_call_active: bool,
}

/// Runs the full hard-filter chain for one candidate against a job of
/// required level `required_level` at `(lat, lng)`, dropping (`None`) at
/// the first failing check.
pub fn qualify(
    candidate: &CandidateRecords<'_>,
    customer_id: Uuid,
    required_level: Level,
    service_lat: f64,
    service_lng: f64,
    search_radius_km: Option<f64>,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Option<QualifiedCandidate> {
    let profile = candidate.profile;

    // 1. Task qualification, no self-match, status gate.
    if !candidate.task_qualified {
        return None;
    }
    if profile.user_id == customer_id {
        return None;
    }
    if !profile.is_eligible_status_for(required_level) {
        return None;
    }

    // 2-3. Geo.
    let (home_lat, home_lng) = (profile.home_lat?, profile.home_lng?);
    let distance_km = geo::haversine_km(service_lat, service_lng, home_lat, home_lng);
    let effective_radius = search_radius_km.map_or(profile.service_radius_km, |r| r.min(profile.service_radius_km));
    if distance_km > effective_radius {
        return None;
    }

    // 4. Level.
    if profile.level.numeric() < required_level.numeric() {
        return None;
    }

    let requires_l3_plus_checks = required_level >= Level::L3;

    // 5. Background check.
    if requires_l3_plus_checks && !profile.background_check.is_cleared_on(today) {
        return None;
    }

    // 6. License credential.
    let has_license = candidate.credentials.iter().any(|c| c.is_valid_license_on(today));
    if requires_l3_plus_checks && !has_license {
        return None;
    }

    // 7. Insurance.
    let has_insurance = candidate.insurance_policies.iter().any(|p| p.is_active_on(today));
    if requires_l3_plus_checks && !has_insurance {
        return None;
    }

    // 8. L4 additional: active on-call shift + $2M insurance floor.
    let on_call_active = candidate.on_call_shifts.iter().any(|s| s.covers(now));
    if required_level == Level::L4 {
        if !on_call_active {
            return None;
        }
        let has_l4_insurance = candidate
            .insurance_policies
            .iter()
            .any(|p| p.is_active_on(today) && p.coverage_cents >= LEVEL_4_MIN_COVERAGE_CENTS);
        if !has_l4_insurance {
            return None;
        }
    }

    Some(QualifiedCandidate {
        provider_id: profile.id,
        distance_km,
        has_license,
        has_insurance,
        on_call_active,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_domain_models::{BackgroundCheck, BackgroundCheckStatus, ProviderStatus};

    fn base_profile(level: Level) -> ProviderProfile {
        ProviderProfile {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            level,
            status: ProviderStatus::Active,
            background_check: BackgroundCheck {
                status: BackgroundCheckStatus::Cleared,
                date: None,
                expiry: None,
            },
            internal_score: 70.0,
            service_radius_km: 25.0,
            home_lat: Some(43.70),
            home_lng: Some(-79.40),
            max_concurrent_jobs: 3,
            available_for_emergency: false,
            is_online: true,
        }
    }

    #[test]
    fn l1_candidate_with_no_l3_records_still_qualifies() {
        let profile = base_profile(Level::L1);
        let candidate = CandidateRecords {
            profile: &profile,
            task_qualified: true,
            credentials: &[],
            insurance_policies: &[],
            on_call_shifts: &[],
        };
        let today = NaiveDate::from_ymd_opt(2026, 7, 26).unwrap();
        let result = qualify(&candidate, Uuid::new_v4(), Level::L1, 43.65, -79.38, None, today, Utc::now());
        assert!(result.is_some());
    }

    #[test]
    fn self_match_is_dropped() {
        let profile = base_profile(Level::L1);
        let customer_id = profile.user_id;
        let candidate = CandidateRecords {
            profile: &profile,
            task_qualified: true,
            credentials: &[],
            insurance_policies: &[],
            on_call_shifts: &[],
        };
        let today = NaiveDate::from_ymd_opt(2026, 7, 26).unwrap();
        let result = qualify(&candidate, customer_id, Level::L1, 43.65, -79.38, None, today, Utc::now());
        assert!(result.is_none());
    }

    #[test]
    fn l3_without_license_is_dropped() {
        let profile = base_profile(Level::L3);
        let candidate = CandidateRecords {
            profile: &profile,
            task_qualified: true,
            credentials: &[],
            insurance_policies: &[],
            on_call_shifts: &[],
        };
        let today = NaiveDate::from_ymd_opt(2026, 7, 26).unwrap();
        let result = qualify(&candidate, Uuid::new_v4(), Level::L3, 43.65, -79.38, None, today, Utc::now());
        assert!(result.is_none());
    }

    #[test]
    fn out_of_radius_is_dropped() {
        let profile = base_profile(Level::L1);
        let candidate = CandidateRecords {
            profile: &profile,
            task_qualified: true,
            credentials: &[],
            insurance_policies: &[],
            on_call_shifts: &[],
        };
        let today = NaiveDate::from_ymd_opt(2026, 7, 26).unwrap();
        // Vancouver vs. the Toronto-area home coordinates above.
        let result = qualify(&candidate, Uuid::new_v4(), Level::L1, 49.28, -123.12, None, today, Utc::now());
        assert!(result.is_none());
    }
}
