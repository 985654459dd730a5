//! The pricing engine entry points: a pre-job estimate (§4.B steps 1-7) and
//! the definitive event recorded at job creation.

use chrono::{NaiveDate, NaiveTime, Utc};
use dispatch_domain_models::{
    CommissionSchedule, CoreError, CoreResult, MultiplierDetail, PriceEstimate, PricingEvent,
    PricingRule, Task,
};
use dispatch_infra_collaborators::{CollaboratorError, WeatherOracle};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use uuid::Uuid;

use crate::commission::{self, CommissionBand};
use crate::multipliers;

/// All emergency multipliers stack multiplicatively but can never push the
/// combined factor past this ceiling (configurable, default 5.0).
pub const DEFAULT_MULTIPLIER_CEILING: Decimal = dec!(5.0);

fn round_cents(amount: Decimal) -> i64 {
    amount
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
        .to_i64()
        .unwrap_or(0)
}

/// Request parameters for a pre-job price estimate.
pub struct QuoteRequest<'a> {
    pub task: &'a Task,
    pub service_lat: f64,
    pub service_lng: f64,
    pub requested_date: NaiveDate,
    pub requested_time: NaiveTime,
    pub is_emergency: bool,
    pub country: String,
    pub configured_rules: Vec<PricingRule>,
    pub commission_schedule: Option<CommissionSchedule>,
}

/// Computes a price estimate without requiring a job to exist yet.
/// `multiplier_ceiling` should come from process configuration.
pub async fn quote(
    req: QuoteRequest<'_>,
    weather: &dyn WeatherOracle,
    multiplier_ceiling: Decimal,
) -> CoreResult<PriceEstimate> {
    let (base_min, base_max) = match (req.task.base_price_min_cents, req.task.base_price_max_cents) {
        (Some(min), Some(max)) => (min, max),
        _ => {
            return Err(CoreError::PricingUnavailable {
                task_id: req.task.id,
                reason: "task has no base pricing configured".into(),
            })
        }
    };

    let mut details: Vec<MultiplierDetail> = Vec::new();
    let mut combined = Decimal::ONE;

    if req.is_emergency {
        if let Some(detail) = multipliers::night_surcharge(req.requested_time) {
            combined *= detail.multiplier;
            details.push(detail);
        }

        match weather.conditions(req.service_lat, req.service_lng).await {
            Ok(conditions) => {
                if let Some(detail) = multipliers::extreme_weather(&conditions) {
                    combined *= detail.multiplier;
                    details.push(detail);
                }
            }
            Err(CollaboratorError::Timeout) => {
                // §7: ExternalTimeout from the weather oracle degrades to
                // non-extreme rather than failing the quote.
            }
            Err(other) => {
                return Err(CoreError::Fatal {
                    detail: format!("weather oracle failed: {other}"),
                })
            }
        }

        if let Some(detail) = multipliers::peak_holiday(req.requested_date) {
            combined *= detail.multiplier;
            details.push(detail);
        }

        for detail in multipliers::configured_surge(&req.configured_rules) {
            combined *= detail.multiplier;
            details.push(detail);
        }

        combined = combined.min(multiplier_ceiling);
    }

    let final_min = round_cents(Decimal::from(base_min) * combined);
    let final_max = round_cents(Decimal::from(base_max) * combined);

    let band: CommissionBand = commission::resolve(req.task.required_level, req.commission_schedule);

    let payout_min = round_cents(Decimal::from(final_min) * (Decimal::ONE - band.max));
    let payout_max = round_cents(Decimal::from(final_max) * (Decimal::ONE - band.min));

    Ok(PriceEstimate {
        base_min_cents: base_min,
        base_max_cents: base_max,
        dynamic_multiplier: combined,
        multiplier_details: details,
        final_min_cents: final_min,
        final_max_cents: final_max,
        commission_rate_min: band.min,
        commission_rate_max: band.max,
        commission_rate_default: band.default,
        payout_min_cents: payout_min,
        payout_max_cents: payout_max,
        currency: if req.country == "CA" { "CAD".into() } else { "USD".into() },
    })
}

/// Records the definitive `PricingEvent` at job-creation time. The final
/// price is the midpoint of the estimate's range; commission uses the
/// schedule default rather than a min/max band (spec §4.B, final paragraph).
pub fn definitive_event(job_id: Uuid, estimate: &PriceEstimate) -> PricingEvent {
    let final_price = round_cents((Decimal::from(estimate.final_min_cents) + Decimal::from(estimate.final_max_cents)) / dec!(2));
    let commission_cents = round_cents(Decimal::from(final_price) * estimate.commission_rate_default);
    let provider_payout_cents = final_price - commission_cents;

    PricingEvent {
        id: Uuid::new_v4(),
        job_id,
        event_type: "job_created".into(),
        base_price_cents: estimate.base_min_cents,
        multiplier_applied: estimate.dynamic_multiplier,
        adjustments_cents: 0,
        final_price_cents: final_price,
        rules_applied: estimate.multiplier_details.clone(),
        commission_rate: estimate.commission_rate_default,
        commission_cents,
        provider_payout_cents,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_domain_models::Level;
    use dispatch_infra_collaborators::doubles::StubWeatherOracle;
    use dispatch_infra_collaborators::WeatherConditions;

    fn fixture_task(level: Level, min: i64, max: i64) -> Task {
        Task {
            id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            slug: "fixture".into(),
            name: "Fixture task".into(),
            required_level: level,
            regulated: false,
            license_required: false,
            hazardous: false,
            structural: false,
            emergency_eligible: true,
            base_price_min_cents: Some(min),
            base_price_max_cents: Some(max),
            estimated_duration_min: Some(60),
            escalation_keywords: vec![],
            active: true,
        }
    }

    fn request<'a>(task: &'a Task, is_emergency: bool, date: NaiveDate, time: NaiveTime) -> QuoteRequest<'a> {
        QuoteRequest {
            task,
            service_lat: 43.65,
            service_lng: -79.38,
            requested_date: date,
            requested_time: time,
            is_emergency,
            country: "CA".into(),
            configured_rules: vec![],
            commission_schedule: None,
        }
    }

    #[tokio::test]
    async fn happy_path_l1_non_emergency_has_no_multiplier() {
        let task = fixture_task(Level::L1, 2500, 4500);
        let date = NaiveDate::from_ymd_opt(2026, 7, 22).unwrap();
        let time = NaiveTime::from_hms_opt(14, 0, 0).unwrap();
        let weather = StubWeatherOracle::calm();

        let estimate = quote(request(&task, false, date, time), &weather, DEFAULT_MULTIPLIER_CEILING)
            .await
            .unwrap();

        assert_eq!(estimate.dynamic_multiplier, Decimal::ONE);
        assert!(estimate.multiplier_details.is_empty());
        assert_eq!(estimate.final_min_cents, 2500);
        assert_eq!(estimate.final_max_cents, 4500);

        let commission = round_cents(Decimal::from(3500) * dec!(0.175));
        assert_eq!(commission, 613);
    }

    #[tokio::test]
    async fn emergency_stacking_clamps_to_ceiling() {
        let task = fixture_task(Level::L4, 15000, 30000);
        // Dec 25 is a listed holiday; 23:00 is inside the night window.
        let date = NaiveDate::from_ymd_opt(2026, 12, 25).unwrap();
        let time = NaiveTime::from_hms_opt(23, 0, 0).unwrap();
        let weather = StubWeatherOracle::forcing(WeatherConditions {
            is_extreme: true,
            description: "blizzard warning".into(),
        });

        let estimate = quote(request(&task, true, date, time), &weather, DEFAULT_MULTIPLIER_CEILING)
            .await
            .unwrap();

        // Raw chain 1.5 x 2.0 x 2.5 = 7.5, clamped to the 5.0 ceiling.
        assert_eq!(estimate.dynamic_multiplier, dec!(5.0));
        assert_eq!(estimate.multiplier_details.len(), 3);
        assert_eq!(estimate.final_min_cents, 75_000);
        assert_eq!(estimate.final_max_cents, 150_000);
    }

    #[tokio::test]
    async fn missing_base_pricing_is_rejected() {
        let mut task = fixture_task(Level::L1, 0, 0);
        task.base_price_min_cents = None;
        let date = NaiveDate::from_ymd_opt(2026, 7, 22).unwrap();
        let time = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        let weather = StubWeatherOracle::calm();

        let err = quote(request(&task, false, date, time), &weather, DEFAULT_MULTIPLIER_CEILING)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::PricingUnavailable { .. }));
    }

    #[tokio::test]
    async fn weather_timeout_degrades_to_non_extreme() {
        let task = fixture_task(Level::L4, 15000, 30000);
        let date = NaiveDate::from_ymd_opt(2026, 7, 22).unwrap();
        let time = NaiveTime::from_hms_opt(23, 0, 0).unwrap();

        struct TimingOutOracle;
        #[async_trait::async_trait]
        impl WeatherOracle for TimingOutOracle {
            async fn conditions(&self, _lat: f64, _lng: f64) -> Result<WeatherConditions, CollaboratorError> {
                Err(CollaboratorError::Timeout)
            }
        }

        let estimate = quote(request(&task, true, date, time), &TimingOutOracle, DEFAULT_MULTIPLIER_CEILING)
            .await
            .unwrap();

        // Only the night surcharge applies; the weather rule is silently skipped.
        assert_eq!(estimate.dynamic_multiplier, NIGHT_MULTIPLIER_FOR_TEST);
    }

    const NIGHT_MULTIPLIER_FOR_TEST: Decimal = dec!(1.5);
}
