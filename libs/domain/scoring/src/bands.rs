//! Per-level score bands and the penalty-point matrix (spec §4.J).

use dispatch_domain_models::{Level, PenaltyType};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBand {
    pub min: f64,
    pub base: f64,
    pub max: f64,
}

pub fn band_for(level: Level) -> ScoreBand {
    match level {
        Level::L1 => ScoreBand {
            min: 40.0,
            base: 70.0,
            max: 90.0,
        },
        Level::L2 => ScoreBand {
            min: 50.0,
            base: 75.0,
            max: 95.0,
        },
        Level::L3 => ScoreBand {
            min: 60.0,
            base: 80.0,
            max: 98.0,
        },
        Level::L4 => ScoreBand {
            min: 70.0,
            base: 85.0,
            max: 100.0,
        },
    }
}

/// Absolute points deducted per infraction, `None` when the infraction
/// doesn't apply at that level (e.g. `bad_review` has no L4 row).
pub fn penalty_points(level: Level, penalty_type: PenaltyType) -> Option<i32> {
    use Level::*;
    use PenaltyType::*;
    match (penalty_type, level) {
        (ResponseTimeout, L1) => Some(2),
        (ResponseTimeout, L2) => Some(4),
        (ResponseTimeout, L3) => Some(6),
        (ResponseTimeout, L4) => Some(15),

        (Cancellation, L1) => Some(3),
        (Cancellation, L2) => Some(6),
        (Cancellation, L3) => Some(10),
        (Cancellation, L4) => Some(25),

        (NoShow, L1) => Some(10),
        (NoShow, L2) => Some(15),
        (NoShow, L3) => Some(30),
        (NoShow, L4) => None, // zero-tolerance: handled as full-score wipe, not a matrix lookup

        (BadReview, L1) => Some(5),
        (BadReview, L2) => Some(7),
        (BadReview, L3) => Some(10),
        (BadReview, L4) => None,

        (SlaBreach, L4) => Some(30),
        (SlaBreach, _) => None,

        (AdminAdjustment, _) | (Recovery, _) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l1_band_matches_spec_table() {
        let band = band_for(Level::L1);
        assert_eq!(band, ScoreBand { min: 40.0, base: 70.0, max: 90.0 });
    }

    #[test]
    fn l4_no_show_has_no_matrix_entry() {
        assert_eq!(penalty_points(Level::L4, PenaltyType::NoShow), None);
    }

    #[test]
    fn l3_cancellation_is_ten_points() {
        assert_eq!(penalty_points(Level::L3, PenaltyType::Cancellation), Some(10));
    }
}
