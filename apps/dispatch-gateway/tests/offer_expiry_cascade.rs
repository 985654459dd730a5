//! §8 scenario 5: once every outstanding offer on a job has gone terminal,
//! the job falls back to `pending_match` and a fresh broadcast goes out —
//! picking up a provider who only became qualified after the first round.

mod support;

use dispatch_domain_models::{AssignmentStatus, JobStatus, Level, PenaltyType};
use serde_json::json;
use uuid::Uuid;

use support::{customer_address, fixture_provider, fixture_task, TestApp, SERVICE_LAT, SERVICE_LNG};

#[tokio::test]
async fn expired_offer_cascades_to_a_fresh_broadcast() {
    let app = TestApp::spawn().await;

    let task = fixture_task(Level::L2, 6_000, 12_000);
    app.seed_task(&task).await;

    let first_provider = fixture_provider(Level::L2);
    app.seed_provider(&first_provider).await;
    app.seed_task_qualification(first_provider.id, task.id, true).await;

    let second_provider = fixture_provider(Level::L2);
    app.seed_provider(&second_provider).await;
    // Not yet qualified at broadcast time — seeded only after the first
    // round expires, so the re-broadcast is what picks them up.

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
                "priority": "standard",
                "is_emergency": false,
                "notes": [],
            })),
        )
        .await;
    assert_eq!(status, 201, "create_job response: {body}");
    assert_eq!(body["offers_sent"], 1, "only the already-qualified provider is offered the job");
    let job_id = Uuid::parse_str(body["job"]["id"].as_str().unwrap()).unwrap();

    let first_round = app.state.assignments.list_for_job(job_id).await.unwrap();
    assert_eq!(first_round.len(), 1);
    let first_assignment = &first_round[0];
    assert_eq!(first_assignment.provider_id, first_provider.id);

    app.set_offer_expires_at(first_assignment.id, chrono::Utc::now() - chrono::Duration::minutes(1)).await;
    app.seed_task_qualification(second_provider.id, task.id, true).await;

    let expired_count = dispatch_gateway::services::sweepers::sweep_offer_expiry(&app.state).await.unwrap();
    assert_eq!(expired_count, 1);

    let first_assignment_after = app.state.assignments.get(first_assignment.id).await.unwrap();
    assert_eq!(first_assignment_after.status, AssignmentStatus::Expired);

    let penalties = app.state.penalties.most_recent_for(first_provider.id).await.unwrap().unwrap();
    assert_eq!(penalties.penalty_type, PenaltyType::ResponseTimeout);

    let job = app.state.jobs.get(job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Matched, "re-broadcast re-matches the job");

    let second_round = app.state.assignments.list_for_job(job_id).await.unwrap();
    let fresh_offer = second_round
        .iter()
        .find(|a| a.provider_id == second_provider.id && a.status == AssignmentStatus::Offered);
    assert!(fresh_offer.is_some(), "the newly-qualified provider should have a fresh offer");
}
