//! Composite-score ranking of qualified candidates (spec §4.E).

use crate::qualifier::QualifiedCandidate;

const WEIGHT_INTERNAL: f64 = 0.6;
const WEIGHT_DISTANCE: f64 = 0.3;
const WEIGHT_RESPONSE: f64 = 0.1;
const DISTANCE_ROLLOFF_KM: f64 = 50.0;
const RESPONSE_CEILING_MIN: f64 = 30.0;

/// A ranked candidate carrying its composite score alongside the fields
/// the assignment coordinator needs to create an offer.
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub candidate: QualifiedCandidate,
    pub composite_score: f64,
}

fn score_internal(internal_score: f64) -> f64 {
    internal_score.clamp(0.0, 100.0) / 100.0
}

fn score_distance(distance_km: f64) -> f64 {
    (1.0 - distance_km / DISTANCE_ROLLOFF_KM).max(0.0)
}

fn score_response(response_time_avg_min: Option<f64>) -> f64 {
    match response_time_avg_min {
        Some(minutes) => 1.0 - minutes.clamp(0.0, RESPONSE_CEILING_MIN) / RESPONSE_CEILING_MIN,
        None => 0.5,
    }
}

/// Ranks qualified candidates, each paired with the provider's `internal_score`
/// and average response time (minutes, `None` if unknown). Sort is
/// descending by composite score, ties broken by lower distance then lower
/// provider id.
pub fn rank(
    candidates: Vec<(QualifiedCandidate, f64, Option<f64>)>,
) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = candidates
        .into_iter()
        .map(|(candidate, internal_score, response_time_avg_min)| {
            let composite = WEIGHT_INTERNAL * score_internal(internal_score)
                + WEIGHT_DISTANCE * score_distance(candidate.distance_km)
                + WEIGHT_RESPONSE * score_response(response_time_avg_min);
            RankedCandidate {
                composite_score: (composite * 100.0).round() / 100.0,
                candidate,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.composite_score
            .partial_cmp(&a.composite_score)
            .unwrap()
            .then_with(|| {
                a.candidate
                    .distance_km
                    .partial_cmp(&b.candidate.distance_km)
                    .unwrap()
            })
            .then_with(|| a.candidate.provider_id.cmp(&b.candidate.provider_id))
    });

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn candidate(distance_km: f64) -> QualifiedCandidate {
        QualifiedCandidate {
            provider_id: Uuid::new_v4(),
            distance_km,
            has_license: true,
            has_insurance: true,
            on_call_active: false,
        }
    }

    #[test]
    fn closer_provider_with_equal_score_ranks_first() {
        let near = candidate(2.0);
        let far = candidate(40.0);
        let ranked = rank(vec![(far, 70.0, None), (near, 70.0, None)]);
        assert_eq!(ranked[0].candidate.distance_km, 2.0);
    }

    #[test]
    fn unknown_response_time_uses_midpoint() {
        let c = candidate(5.0);
        let ranked = rank(vec![(c, 70.0, None)]);
        // score_internal=0.7, score_distance=0.9, score_response=0.5
        // composite = 0.6*0.7 + 0.3*0.9 + 0.1*0.5 = 0.74
        assert!((ranked[0].composite_score - 0.74).abs() < 1e-9);
    }
}
