//! Score mutation and the append-only audit trail (spec §4.J). Every
//! function here returns the `PenaltyRecord` to append alongside the new
//! score and suspension flag; callers own the row lock and the write.

use chrono::{DateTime, Utc};
use dispatch_domain_models::{Level, PenaltyRecord, PenaltyType};
use uuid::Uuid;

use crate::bands;

/// The outcome of applying a penalty or recovery: the new score, whether
/// the provider must be suspended as a result, and the audit row.
pub struct LedgerOutcome {
    pub new_score: f64,
    pub suspend: bool,
    pub record: PenaltyRecord,
}

/// Applies an infraction penalty. L4 `no_show` is the zero-tolerance case:
/// the score is wiped to 0 and the provider is suspended regardless of the
/// matrix (spec "Zero-tolerance rule"). Any other deduction that clamps the
/// score to the level minimum also suspends the provider.
pub fn penalize(
    provider_id: Uuid,
    level: Level,
    current_score: f64,
    penalty_type: PenaltyType,
    job_id: Option<Uuid>,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> LedgerOutcome {
    let band = bands::band_for(level);

    if level == Level::L4 && penalty_type == PenaltyType::NoShow {
        let points_deducted = current_score.round() as i32;
        return LedgerOutcome {
            new_score: 0.0,
            suspend: true,
            record: PenaltyRecord {
                id: Uuid::new_v4(),
                provider_id,
                penalty_type,
                points_deducted,
                applied_at: now,
                job_id,
                reason,
            },
        };
    }

    let points = bands::penalty_points(level, penalty_type).unwrap_or(0);
    let raw_score = current_score - points as f64;
    let clamped = raw_score.max(band.min);
    let suspend = clamped == band.min && raw_score < band.min;

    LedgerOutcome {
        new_score: clamped,
        suspend,
        record: PenaltyRecord {
            id: Uuid::new_v4(),
            provider_id,
            penalty_type,
            points_deducted: points,
            applied_at: now,
            job_id,
            reason,
        },
    }
}

/// Weekly normalization: restores `min(5, base - current)` points to a
/// provider below `base` with zero penalties in the preceding 7 days.
/// Returns `None` when the provider isn't eligible (at or above base, or
/// penalized within the window).
pub fn recover(
    provider_id: Uuid,
    level: Level,
    current_score: f64,
    last_penalty_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<LedgerOutcome> {
    let band = bands::band_for(level);
    if current_score >= band.base {
        return None;
    }
    if let Some(last) = last_penalty_at {
        if now - last < chrono::Duration::days(7) {
            return None;
        }
    }

    let points_restored = (5.0_f64).min(band.base - current_score);
    if points_restored <= 0.0 {
        return None;
    }
    let new_score = (current_score + points_restored).min(band.base);

    Some(LedgerOutcome {
        new_score,
        suspend: false,
        record: PenaltyRecord {
            id: Uuid::new_v4(),
            provider_id,
            penalty_type: PenaltyType::Recovery,
            points_deducted: -(points_restored.round() as i32),
            applied_at: now,
            job_id: None,
            reason: Some("weekly normalization".into()),
        },
    })
}

/// Admin adjustment: `delta` may be positive (credit) or negative
/// (deduction); the resulting score is clamped to `[min, max]`.
pub fn adjust(
    provider_id: Uuid,
    level: Level,
    current_score: f64,
    delta: f64,
    reason: String,
    now: DateTime<Utc>,
) -> LedgerOutcome {
    let band = bands::band_for(level);
    let new_score = (current_score + delta).clamp(band.min, band.max);
    let suspend = new_score == band.min && current_score + delta < band.min;

    LedgerOutcome {
        new_score,
        suspend,
        record: PenaltyRecord {
            id: Uuid::new_v4(),
            provider_id,
            penalty_type: PenaltyType::AdminAdjustment,
            points_deducted: -(delta.round() as i32),
            applied_at: now,
            job_id: None,
            reason: Some(reason),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l4_no_show_wipes_score_and_suspends() {
        let outcome = penalize(
            Uuid::new_v4(),
            Level::L4,
            85.0,
            PenaltyType::NoShow,
            None,
            None,
            Utc::now(),
        );
        assert_eq!(outcome.new_score, 0.0);
        assert!(outcome.suspend);
        assert_eq!(outcome.record.points_deducted, 85);
    }

    #[test]
    fn clamp_at_minimum_suspends() {
        // L1 min=40; current 41 minus a 10-point no_show clamps to 40.
        let outcome = penalize(Uuid::new_v4(), Level::L1, 41.0, PenaltyType::NoShow, None, None, Utc::now());
        assert_eq!(outcome.new_score, 40.0);
        assert!(outcome.suspend);
    }

    #[test]
    fn deduction_that_stays_above_minimum_does_not_suspend() {
        let outcome = penalize(
            Uuid::new_v4(),
            Level::L2,
            75.0,
            PenaltyType::ResponseTimeout,
            None,
            None,
            Utc::now(),
        );
        assert_eq!(outcome.new_score, 71.0);
        assert!(!outcome.suspend);
    }

    #[test]
    fn recovery_is_capped_at_five_points_and_at_base() {
        let now = Utc::now();
        let outcome = recover(Uuid::new_v4(), Level::L1, 67.0, Some(now - chrono::Duration::days(10)), now).unwrap();
        assert_eq!(outcome.new_score, 70.0);
    }

    #[test]
    fn recovery_refused_with_recent_penalty() {
        let now = Utc::now();
        let outcome = recover(Uuid::new_v4(), Level::L1, 60.0, Some(now - chrono::Duration::days(2)), now);
        assert!(outcome.is_none());
    }

    #[test]
    fn recovery_never_exceeds_base() {
        let now = Utc::now();
        let outcome = recover(Uuid::new_v4(), Level::L1, 69.0, None, now).unwrap();
        assert_eq!(outcome.new_score, 70.0);
    }
}
