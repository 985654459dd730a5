//! Emergency multiplier stacking clamps to the configured ceiling. Night,
//! weekend, and holiday surcharges all depend on wall-clock time, so this
//! only asserts on the part of the stack that's deterministic regardless of
//! when the suite runs: forced extreme weather plus two configured surge
//! rules alone already exceed the default 5.0 ceiling, and the ceiling clamp
//! makes the final price exact no matter what else stacked on top of it.

mod support;

use std::sync::Arc;

use dispatch_domain_models::Level;
use dispatch_infra_collaborators::doubles::StubWeatherOracle;
use dispatch_infra_collaborators::WeatherConditions;
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

use support::{customer_address, fixture_configured_surge_rule, fixture_task, TestApp, SERVICE_LAT, SERVICE_LNG};

#[tokio::test]
async fn stacked_multipliers_clamp_to_ceiling() {
    let app = TestApp::spawn_with_weather(Arc::new(StubWeatherOracle::forcing(WeatherConditions {
        is_extreme: true,
        description: "forced for test".into(),
    })))
    .await;

    let task = fixture_task(Level::L4, 15_000, 30_000);
    app.seed_task(&task).await;
    app.seed_pricing_rule(&fixture_configured_surge_rule(task.id, dec!(2.0))).await;
    app.seed_pricing_rule(&fixture_configured_surge_rule(task.id, dec!(2.5))).await;

    let customer_token = TestApp::token(Uuid::new_v4(), "customer");

    let (status, body) = app
        .call(
            "POST",
            "/api/v1/customer/jobs",
            Some(&customer_token),
            Some(json!({
                "task_id": task.id,
                "service_lat": SERVICE_LAT,
                "service_lng": SERVICE_LNG,
                "service_address": customer_address(),
                "priority": "emergency",
                "is_emergency": true,
                "notes": [],
            })),
        )
        .await;
    assert_eq!(status, 201, "create_job response: {body}");

    let job_id = Uuid::parse_str(body["job"]["id"].as_str().unwrap()).unwrap();
    let job = app.state.jobs.get(job_id).await.unwrap();

    // Weather (2.0) x configured surge (2.0) x configured surge (2.5) = 10.0
    // raw, already past the 5.0 ceiling before any time-of-day surcharge is
    // even considered — so the clamp, and everything derived from it, is
    // exact no matter what the wall clock adds on top.
    assert_eq!(job.quoted_price_cents, 112_500, "(75_000 + 150_000) / 2 once clamped to the 5.0 ceiling");
    assert_eq!(job.commission_cents, 11_250, "L4's static 0.10 default commission rate");
    assert_eq!(job.provider_payout_cents, 101_250);
    assert_eq!(job.commission_cents + job.provider_payout_cents, job.quoted_price_cents);

    let events = app.state.pricing.commission_schedule(Level::L4, "CA").await.unwrap();
    assert!(events.is_none(), "no commission_schedules row seeded; static default band applies");
}
