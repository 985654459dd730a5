//! The fixed holiday calendar the peak-surcharge rule checks against
//! (spec §4.B step 3).

use chrono::{Datelike, NaiveDate};

/// (month, day) pairs. Deliberately simplified — several of these shift
/// yearly in reality but the core only needs a stable lookup table.
const HOLIDAYS: &[(u32, u32)] = &[
    (1, 1),   // New Year's Day
    (2, 17),  // Family Day / Presidents' Day (approximate)
    (4, 18),  // Good Friday (approximate)
    (5, 19),  // Victoria Day (approximate)
    (7, 1),   // Canada Day
    (7, 4),   // Independence Day
    (9, 1),   // Labour Day (approximate)
    (10, 13), // Thanksgiving (CA, approximate)
    (11, 11), // Remembrance Day / Veterans Day
    (12, 25), // Christmas Day
    (12, 26), // Boxing Day
    (12, 31), // New Year's Eve
];

fn is_listed(month: u32, day: u32) -> bool {
    HOLIDAYS.contains(&(month, day))
}

/// Peak surcharge tier for a calendar date: 2.5 on the holiday itself, 1.5
/// on the adjacent day, 1.25 on an unrelated weekend day, 1.0 otherwise.
pub fn peak_tier(date: NaiveDate) -> PeakTier {
    if is_listed(date.month(), date.day()) {
        return PeakTier::Holiday;
    }
    let day_before = date.pred_opt().unwrap_or(date);
    let day_after = date.succ_opt().unwrap_or(date);
    if is_listed(day_before.month(), day_before.day()) || is_listed(day_after.month(), day_after.day()) {
        return PeakTier::AdjacentToHoliday;
    }
    // Mon=0 .. Sun=6; weekend is Sat/Sun.
    if matches!(date.weekday().num_days_from_monday(), 5 | 6) {
        return PeakTier::Weekend;
    }
    PeakTier::Regular
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeakTier {
    Holiday,
    AdjacentToHoliday,
    Weekend,
    Regular,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn christmas_is_a_holiday() {
        let d = NaiveDate::from_ymd_opt(2026, 12, 25).unwrap();
        assert_eq!(peak_tier(d), PeakTier::Holiday);
    }

    #[test]
    fn day_after_christmas_is_boxing_day_itself_a_holiday() {
        // Dec 26 is independently listed as Boxing Day.
        let d = NaiveDate::from_ymd_opt(2026, 12, 26).unwrap();
        assert_eq!(peak_tier(d), PeakTier::Holiday);
    }

    #[test]
    fn day_before_new_year_is_adjacent() {
        let d = NaiveDate::from_ymd_opt(2026, 12, 30).unwrap();
        assert_eq!(peak_tier(d), PeakTier::AdjacentToHoliday);
    }

    #[test]
    fn ordinary_weekend_day() {
        // 2026-07-25 is a Saturday, not adjacent to any listed holiday.
        let d = NaiveDate::from_ymd_opt(2026, 7, 25).unwrap();
        assert_eq!(peak_tier(d), PeakTier::Weekend);
    }

    #[test]
    fn ordinary_weekday() {
        let d = NaiveDate::from_ymd_opt(2026, 7, 22).unwrap();
        assert_eq!(peak_tier(d), PeakTier::Regular);
    }
}
