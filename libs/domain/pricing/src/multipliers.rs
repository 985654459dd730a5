//! Individual emergency-only multiplier rules (spec §4.B step 3). Each rule
//! is independent; `engine::quote` is the one place that stacks them.

use chrono::{NaiveDate, NaiveTime};
use dispatch_domain_models::{MultiplierDetail, PricingRule, PricingRuleType};
use dispatch_infra_collaborators::WeatherConditions;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::holidays::{self, PeakTier};

const NIGHT_START: NaiveTime = match NaiveTime::from_hms_opt(22, 0, 0) {
    Some(t) => t,
    None => unreachable!(),
};
const NIGHT_END: NaiveTime = match NaiveTime::from_hms_opt(6, 0, 0) {
    Some(t) => t,
    None => unreachable!(),
};

pub const NIGHT_MULTIPLIER: Decimal = dec!(1.5);
pub const EXTREME_WEATHER_MULTIPLIER: Decimal = dec!(2.0);
pub const HOLIDAY_MULTIPLIER: Decimal = dec!(2.5);
pub const ADJACENT_HOLIDAY_MULTIPLIER: Decimal = dec!(1.5);
pub const WEEKEND_MULTIPLIER: Decimal = dec!(1.25);

pub fn night_surcharge(requested_time: NaiveTime) -> Option<MultiplierDetail> {
    let is_night = requested_time >= NIGHT_START || requested_time < NIGHT_END;
    is_night.then(|| MultiplierDetail {
        rule_name: "Night Surcharge".into(),
        rule_type: "off_hours_surcharge".into(),
        multiplier: NIGHT_MULTIPLIER,
        reason: "Service requested during night hours (10:00 PM-6:00 AM)".into(),
    })
}

pub fn extreme_weather(conditions: &WeatherConditions) -> Option<MultiplierDetail> {
    conditions.is_extreme.then(|| MultiplierDetail {
        rule_name: "Extreme Weather Surcharge".into(),
        rule_type: "emergency_premium".into(),
        multiplier: EXTREME_WEATHER_MULTIPLIER,
        reason: format!("Extreme weather conditions: {}", conditions.description),
    })
}

pub fn peak_holiday(requested_date: NaiveDate) -> Option<MultiplierDetail> {
    let multiplier = match holidays::peak_tier(requested_date) {
        PeakTier::Holiday => HOLIDAY_MULTIPLIER,
        PeakTier::AdjacentToHoliday => ADJACENT_HOLIDAY_MULTIPLIER,
        PeakTier::Weekend => WEEKEND_MULTIPLIER,
        PeakTier::Regular => return None,
    };
    Some(MultiplierDetail {
        rule_name: "Peak / Holiday Surcharge".into(),
        rule_type: "holiday_surcharge".into(),
        multiplier,
        reason: format!("Service requested on a holiday or peak period ({requested_date})"),
    })
}

/// Configured surge rules loaded from the relational store whose scope
/// matches the request (task/level/country already filtered by the caller).
pub fn configured_surge(rules: &[PricingRule]) -> Vec<MultiplierDetail> {
    rules
        .iter()
        .filter(|r| {
            matches!(
                r.rule_type,
                PricingRuleType::DemandSurge | PricingRuleType::LevelPremium | PricingRuleType::DistanceAdjustment
            ) && r.active
        })
        .map(|r| MultiplierDetail {
            rule_name: r.name.clone(),
            rule_type: match r.rule_type {
                PricingRuleType::DemandSurge => "demand_surge".into(),
                PricingRuleType::LevelPremium => "level_premium".into(),
                PricingRuleType::DistanceAdjustment => "distance_adjustment".into(),
            },
            multiplier: r.multiplier_max,
            reason: r
                .description
                .clone()
                .unwrap_or_else(|| format!("Pricing rule: {}", r.name)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_pm_is_night() {
        assert!(night_surcharge(NaiveTime::from_hms_opt(22, 0, 0).unwrap()).is_some());
    }

    #[test]
    fn noon_is_not_night() {
        assert!(night_surcharge(NaiveTime::from_hms_opt(12, 0, 0).unwrap()).is_none());
    }

    #[test]
    fn five_fifty_nine_am_is_still_night() {
        assert!(night_surcharge(NaiveTime::from_hms_opt(5, 59, 0).unwrap()).is_some());
    }

    #[test]
    fn calm_weather_applies_no_surcharge() {
        let calm = WeatherConditions {
            is_extreme: false,
            description: "clear".into(),
        };
        assert!(extreme_weather(&calm).is_none());
    }
}
