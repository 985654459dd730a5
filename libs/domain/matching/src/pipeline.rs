//! The matching pipeline: qualify then rank, returning the broadcast
//! candidate list (spec §4.F).

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::qualifier::{self, CandidateRecords};
use crate::ranking::{self, RankedCandidate};
use dispatch_domain_models::Level;

pub const DEFAULT_MAX_RESULTS: usize = 10;

/// One row of provider records plus the response-time average the ranking
/// stage needs. Assembled by the caller from separate repository lookups.
pub struct CandidateInput<'a> {
    pub records: CandidateRecords<'a>,
    pub response_time_avg_min: Option<f64>,
}

/// Runs geo → qualifier → ranking and returns the top `max_results`
/// candidates by composite score.
pub fn find_matching_providers(
    candidates: Vec<CandidateInput<'_>>,
    customer_id: Uuid,
    required_level: Level,
    service_lat: f64,
    service_lng: f64,
    search_radius_km: Option<f64>,
    today: NaiveDate,
    now: DateTime<Utc>,
    max_results: usize,
) -> Vec<RankedCandidate> {
    let qualified: Vec<_> = candidates
        .into_iter()
        .filter_map(|input| {
            let internal_score = input.records.profile.internal_score;
            let response_time_avg_min = input.response_time_avg_min;
            qualifier::qualify(
                &input.records,
                customer_id,
                required_level,
                service_lat,
                service_lng,
                search_radius_km,
                today,
                now,
            )
            .map(|c| (c, internal_score, response_time_avg_min))
        })
        .collect();

    let mut ranked = ranking::rank(qualified);
    ranked.truncate(max_results);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use dispatch_domain_models::{BackgroundCheck, BackgroundCheckStatus, ProviderProfile, ProviderStatus};

    fn provider(internal_score: f64, home: (f64, f64)) -> ProviderProfile {
        ProviderProfile {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            level: Level::L1,
            status: ProviderStatus::Active,
            background_check: BackgroundCheck {
                status: BackgroundCheckStatus::Cleared,
                date: None,
                expiry: None,
            },
            internal_score,
            service_radius_km: 30.0,
            home_lat: Some(home.0),
            home_lng: Some(home.1),
            max_concurrent_jobs: 3,
            available_for_emergency: false,
            is_online: true,
        }
    }

    #[test]
    fn returns_at_most_max_results() {
        let providers: Vec<_> = (0..15).map(|i| provider(50.0 + i as f64, (43.66, -79.39))).collect();
        let inputs: Vec<_> = providers
            .iter()
            .map(|p| CandidateInput {
                records: CandidateRecords {
                    profile: p,
                    task_qualified: true,
                    credentials: &[],
                    insurance_policies: &[],
                    on_call_shifts: &[],
                },
                response_time_avg_min: None,
            })
            .collect();

        let today = NaiveDate::from_ymd_opt(2026, 7, 26).unwrap();
        let result = find_matching_providers(
            inputs,
            Uuid::new_v4(),
            Level::L1,
            43.65,
            -79.38,
            None,
            today,
            Utc::now(),
            DEFAULT_MAX_RESULTS,
        );
        assert_eq!(result.len(), DEFAULT_MAX_RESULTS);
    }
}
