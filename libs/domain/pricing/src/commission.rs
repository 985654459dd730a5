//! Commission band resolution: DB-sourced schedule with static fallback
//! defaults per level (spec §4.B step 6).

use dispatch_domain_models::{CommissionSchedule, Level};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Static fallback used when no active `CommissionSchedule` row matches
/// (level, country) for today.
pub fn static_default(level: Level) -> CommissionBand {
    match level {
        Level::L1 => CommissionBand {
            min: dec!(0.15),
            max: dec!(0.20),
            default: dec!(0.20),
        },
        Level::L2 => CommissionBand {
            min: dec!(0.12),
            max: dec!(0.18),
            default: dec!(0.18),
        },
        Level::L3 => CommissionBand {
            min: dec!(0.10),
            max: dec!(0.15),
            default: dec!(0.15),
        },
        Level::L4 => CommissionBand {
            min: dec!(0.05),
            max: dec!(0.10),
            default: dec!(0.10),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommissionBand {
    pub min: Decimal,
    pub max: Decimal,
    pub default: Decimal,
}

impl From<CommissionSchedule> for CommissionBand {
    fn from(schedule: CommissionSchedule) -> Self {
        Self {
            min: schedule.min,
            max: schedule.max,
            default: schedule.default,
        }
    }
}

/// Picks the schedule effective for `level`, falling back to the static
/// default when the store has no active row for (level, country).
pub fn resolve(level: Level, schedule: Option<CommissionSchedule>) -> CommissionBand {
    schedule.map(CommissionBand::from).unwrap_or_else(|| static_default(level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l1_fallback_matches_spec_band() {
        let band = static_default(Level::L1);
        assert_eq!(band.min, dec!(0.15));
        assert_eq!(band.max, dec!(0.20));
    }

    #[test]
    fn l4_fallback_is_the_cheapest_band() {
        let band = static_default(Level::L4);
        assert_eq!(band.min, dec!(0.05));
        assert_eq!(band.max, dec!(0.10));
    }
}
