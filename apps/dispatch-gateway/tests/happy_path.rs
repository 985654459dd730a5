//! End-to-end job lifecycle: creation, broadcast, acceptance, approval,
//! en route, arrival, completion, and rating — with the exact commission
//! split asserted along the way.

mod support;

use dispatch_domain_models::{JobStatus, Level};
use serde_json::json;
use uuid::Uuid;

use support::{customer_address, fixture_provider, fixture_task, TestApp, SERVICE_LAT, SERVICE_LNG};

#[tokio::test]
async fn customer_to_completed_rating_round_trip() {
    let app = TestApp::spawn().await;

    let task = fixture_task(Level::L1, 10_000, 20_000);
    app.seed_task(&task).await;

    let provider = fixture_provider(Level::L1);
    app.seed_provider(&provider).await;
    app.seed_task_qualification(provider.id, task.id, true).await;

    let customer_id = Uuid::new_v4();
    let customer_token = TestApp::token(customer_id, "customer");
    let provider_token = TestApp::token(provider.id, "provider");

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
                "priority": "standard",
                "is_emergency": false,
                "notes": [],
            })),
        )
        .await;
    assert_eq!(status, 201, "create_job response: {body}");
    assert_eq!(body["offers_sent"], 1);
    let job_id = body["job"]["id"].as_str().unwrap().to_string();

    // Non-emergency: no multiplier applies, so the quote is exactly the
    // task's base range with no surcharge.
    assert_eq!(body["job"]["quoted_price_cents"], 15_000);
    assert_eq!(body["job"]["commission_cents"], 3_000);
    assert_eq!(body["job"]["provider_payout_cents"], 12_000);

    let (status, _) = app
        .call("POST", &format!("/api/v1/provider/jobs/{job_id}/accept"), Some(&provider_token), None)
        .await;
    assert_eq!(status, 204);

    let job = app.state.jobs.get(Uuid::parse_str(&job_id).unwrap()).await.unwrap();
    assert_eq!(job.status, JobStatus::PendingApproval);

    let (status, _) = app
        .call("POST", &format!("/api/v1/customer/jobs/{job_id}/approve-provider"), Some(&customer_token), None)
        .await;
    assert_eq!(status, 204);

    let job_uuid = Uuid::parse_str(&job_id).unwrap();
    let job = app.state.jobs.get(job_uuid).await.unwrap();
    assert_eq!(job.status, JobStatus::Scheduled);

    // No service operation drives `scheduled -> provider_accepted`: the
    // transition table allows it for a system actor, but nothing in the
    // handler surface calls it. Bridge it directly through the repository
    // the way an out-of-scope provider-confirmation step would.
    let advanced = app
        .state
        .jobs
        .compare_and_set_status(job_uuid, JobStatus::Scheduled, JobStatus::ProviderAccepted)
        .await
        .unwrap();
    assert!(advanced);

    let (status, _) = app
        .call(
            "POST",
            &format!("/api/v1/provider/jobs/{job_id}/en-route"),
            Some(&provider_token),
            Some(json!({"lat": SERVICE_LAT, "lng": SERVICE_LNG, "heading": null, "speed": null, "accuracy": null})),
        )
        .await;
    assert_eq!(status, 204);

    let (status, _) = app
        .call("POST", &format!("/api/v1/provider/jobs/{job_id}/arrived"), Some(&provider_token), None)
        .await;
    assert_eq!(status, 204);

    let (status, _) = app
        .call("POST", &format!("/api/v1/provider/jobs/{job_id}/start"), Some(&provider_token), None)
        .await;
    assert_eq!(status, 204);

    let (status, _) = app
        .call("POST", &format!("/api/v1/provider/jobs/{job_id}/complete"), Some(&provider_token), None)
        .await;
    assert_eq!(status, 204);

    let job = app.state.jobs.get(job_uuid).await.unwrap();
    assert_eq!(job.status, JobStatus::Completed);

    let (status, body) = app
        .call(
            "POST",
            &format!("/api/v1/customer/jobs/{job_id}/rating"),
            Some(&customer_token),
            Some(json!({"stars": 5, "feedback": "great work"})),
        )
        .await;
    assert_eq!(status, 201, "rate_job response: {body}");
    assert_eq!(body["stars"], 5);

    let rating = app.state.ratings.for_job(job_uuid).await.unwrap();
    assert_eq!(rating.unwrap().stars, 5);

    // A 5-star rating is not a `bad_review` infraction, so the score is
    // untouched from its seeded L1 base.
    let final_provider = app.state.providers.get(provider.id).await.unwrap();
    assert_eq!(final_provider.internal_score, dispatch_domain_scoring::band_for(Level::L1).base);
}
