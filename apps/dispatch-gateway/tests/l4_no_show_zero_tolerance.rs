//! §4.J zero tolerance: an L4 provider who never shows up by the SLA
//! arrival deadline drops straight to a score of 0 and is suspended,
//! regardless of the ordinary penalty matrix. There's no HTTP path that
//! gets an assignment into `accepted` with an overdue arrival deadline
//! without waiting out the real clock, so this test builds the job and
//! assignment directly through the repositories and drives the sweep
//! function the background daemon would have called.

mod support;

use chrono::{Duration, Utc};
use dispatch_domain_models::{
    Assignment, AssignmentStatus, Job, JobStatus, Level, Priority, ProviderStatus, SlaSnapshot,
};
use uuid::Uuid;

use support::{customer_address, fixture_provider, fixture_task, TestApp};

#[tokio::test]
async fn overdue_arrival_zeroes_the_score_and_suspends() {
    let app = TestApp::spawn().await;
    let now = Utc::now();

    let task = fixture_task(Level::L4, 50_000, 90_000);
    app.seed_task(&task).await;

    let provider = fixture_provider(Level::L4);
    app.seed_provider(&provider).await;

    let job = Job {
        id: Uuid::new_v4(),
        reference: "TSK-000001".into(),
        customer_id: Uuid::new_v4(),
        task_id: task.id,
        status: JobStatus::Scheduled,
        priority: Priority::Emergency,
        is_emergency: true,
        service_lat: support::SERVICE_LAT,
        service_lng: support::SERVICE_LNG,
        service_address: customer_address(),
        requested_date: None,
        requested_time_start: None,
        requested_time_end: None,
        flexible_schedule: true,
        sla_snapshot: SlaSnapshot::degraded(now),
        quoted_price_cents: 70_000,
        commission_rate: rust_decimal::Decimal::from(0),
        commission_cents: 7_000,
        provider_payout_cents: 63_000,
        currency: "USD".into(),
        customer_notes: vec![],
        started_at: None,
        completed_at: None,
        cancelled_at: None,
        cancellation_reason: None,
    };
    app.state.jobs.insert(&job).await.unwrap();

    let assignment = Assignment {
        id: Uuid::new_v4(),
        job_id: job.id,
        provider_id: provider.id,
        status: AssignmentStatus::Accepted,
        offered_at: now - Duration::hours(2),
        offer_expires_at: now - Duration::hours(1),
        responded_at: Some(now - Duration::hours(1)),
        decline_reason: None,
        sla_response_deadline: now - Duration::hours(1),
        sla_arrival_deadline: Some(now - Duration::minutes(30)),
        sla_completion_deadline: None,
        sla_response_met: Some(true),
        sla_arrival_met: None,
        sla_completion_met: None,
        en_route_at: None,
        arrived_at: None,
        started_work_at: None,
        completed_at: None,
        match_score: 90.0,
    };
    app.state.assignments.insert(&assignment).await.unwrap();

    dispatch_gateway::services::sweepers::sweep_sla_warnings(&app.state, 5).await.unwrap();

    let updated_assignment = app.state.assignments.get(assignment.id).await.unwrap();
    assert_eq!(updated_assignment.sla_arrival_met, Some(false));

    let updated_provider = app.state.providers.get(provider.id).await.unwrap();
    assert_eq!(updated_provider.internal_score, 0.0);
    assert_eq!(updated_provider.status, ProviderStatus::Suspended);

    let penalties = app.state.penalties.most_recent_for(provider.id).await.unwrap();
    assert!(penalties.is_some());
}
