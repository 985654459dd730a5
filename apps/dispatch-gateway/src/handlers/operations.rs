//! The narrow actor-authenticated service-operation surface (spec §6).
//! Grouped by actor the way the exposed-operations list is grouped:
//! customer, provider, admin.

use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use dispatch_domain_models::{
    Actor, Assignment, AssignmentStatus, Credential, CredentialStatus, CredentialType, CoreError,
    DomainEvent, Job, JobStatus, Level, Priority, ProviderStatus, Rating, ServiceAddress, SlaSnapshot,
};
use dispatch_infra_collaborators::VerifiedIdentity;
use dispatch_infra_db::DbError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::handlers::error::{ApiError, ApiResult};
use crate::services::scoring::apply_penalty;
use crate::services::sweepers::publish_job_completed;
use crate::state::AppState;

const REFERENCE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// §7: `ConflictingState` is retried up to 3x for idempotent operations
/// before being surfaced to the caller.
const CONFLICT_RETRY_ATTEMPTS: u32 = 3;

fn generate_reference() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| REFERENCE_ALPHABET[rng.gen_range(0..REFERENCE_ALPHABET.len())] as char)
        .collect();
    format!("TSK-{suffix}")
}

fn require_role(identity: &VerifiedIdentity, role: &str) -> ApiResult<()> {
    if identity.role != role {
        return Err(ApiError(CoreError::Unauthorized {
            reason: format!("actor role `{}` may not call this operation", identity.role),
        }));
    }
    Ok(())
}

// ---------------------------------------------------------------- Customer

pub struct CustomerOperations;

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub task_id: Uuid,
    pub service_lat: f64,
    pub service_lng: f64,
    pub service_address: ServiceAddress,
    pub priority: Priority,
    pub is_emergency: bool,
    pub notes: Vec<dispatch_domain_models::CustomerNote>,
}

impl CustomerOperations {
    /// `create_job`: resolves the SLA profile, quotes the price, persists
    /// the job, then runs the matching pipeline and broadcasts offers to the
    /// top candidates.
    #[instrument(skip(state, identity, req))]
    pub async fn create_job(
        State(state): State<AppState>,
        Extension(identity): Extension<VerifiedIdentity>,
        Json(req): Json<CreateJobRequest>,
    ) -> ApiResult<impl IntoResponse> {
        require_role(&identity, "customer")?;

        let task = state.tasks.get(req.task_id).await?;
        if !task.active {
            return Err(ApiError(CoreError::ValidationFailed {
                reason: "task is not currently offered".into(),
            }));
        }

        let now = Utc::now();

        let sla_candidates = state
            .sla_profiles
            .candidates(task.required_level, &req.service_address.country, task.id)
            .await?;
        let sla_profile = dispatch_domain_models::find_sla(
            &sla_candidates,
            task.id,
            &req.service_address.city,
            &req.service_address.region,
            &req.service_address.postal_code,
            now.date_naive(),
        );
        let sla_snapshot = match sla_profile {
            Some(profile) => SlaSnapshot::from_profile(profile, now),
            None => SlaSnapshot::degraded(now),
        };

        let estimate = dispatch_domain_pricing::quote(
            dispatch_domain_pricing::QuoteRequest {
                task: &task,
                service_lat: req.service_lat,
                service_lng: req.service_lng,
                requested_date: now.date_naive(),
                requested_time: now.time(),
                is_emergency: req.is_emergency,
                country: req.service_address.country.clone(),
                configured_rules: state
                    .pricing
                    .active_rules_for_task(task.id, task.required_level, &req.service_address.country)
                    .await?,
                commission_schedule: state
                    .pricing
                    .commission_schedule(task.required_level, req.service_address.country.clone())
                    .await?,
            },
            state.weather_oracle.as_ref(),
            state.config.dynamic_multiplier_ceiling,
        )
        .await
        .map_err(ApiError)?;

        let job_id = Uuid::new_v4();
        let pricing_event = dispatch_domain_pricing::definitive_event(job_id, &estimate);

        let job = Job {
            id: job_id,
            reference: generate_reference(),
            customer_id: identity.subject_id,
            task_id: task.id,
            status: JobStatus::PendingMatch,
            priority: req.priority,
            is_emergency: req.is_emergency,
            service_lat: req.service_lat,
            service_lng: req.service_lng,
            service_address: req.service_address,
            requested_date: None,
            requested_time_start: None,
            requested_time_end: None,
            flexible_schedule: true,
            sla_snapshot: sla_snapshot.clone(),
            quoted_price_cents: pricing_event.final_price_cents,
            commission_rate: pricing_event.commission_rate,
            commission_cents: pricing_event.commission_cents,
            provider_payout_cents: pricing_event.provider_payout_cents,
            currency: "USD".into(),
            customer_notes: req.notes,
            started_at: None,
            completed_at: None,
            cancelled_at: None,
            cancellation_reason: None,
        };

        state.jobs.insert(&job).await?;
        state.pricing.insert_event(&pricing_event).await?;
        state.event_bus.publish(DomainEvent::JobCreated {
            job_id: job.id,
            customer_id: job.customer_id,
            task_id: job.task_id,
        });
        state.event_bus.publish(DomainEvent::SlaSnapshotCaptured {
            job_id: job.id,
            profile_id: sla_snapshot.profile_id,
        });

        let assignments = broadcast_matching_offers(&state, &job, task.required_level, now).await?;

        Ok((StatusCode::CREATED, Json(json!({ "job": job, "offers_sent": assignments.len() }))))
    }

    #[instrument(skip(state, identity))]
    pub async fn cancel_job(
        State(state): State<AppState>,
        Extension(identity): Extension<VerifiedIdentity>,
        Path(job_id): Path<Uuid>,
        Json(body): Json<CancelRequest>,
    ) -> ApiResult<impl IntoResponse> {
        require_role(&identity, "customer")?;
        let mut job = state.jobs.get(job_id).await?;
        if job.customer_id != identity.subject_id {
            return Err(ApiError(CoreError::Unauthorized {
                reason: "not the job's customer".into(),
            }));
        }

        let outcome = dispatch_domain_lifecycle::transition(
            &mut job,
            JobStatus::CancelledByCustomer,
            Actor::Customer,
            Some(body.reason.clone()),
        )
        .map_err(ApiError)?;

        state.jobs.save_transition(&job).await?;
        for assignment in state.assignments.list_for_job(job_id).await? {
            if matches!(assignment.status, AssignmentStatus::Offered | AssignmentStatus::Accepted) {
                state
                    .assignments
                    .set_status(assignment.id, AssignmentStatus::Cancelled, Some(body.reason.clone()))
                    .await?;
            }
        }

        state.event_bus.publish(outcome.event);
        state.event_bus.publish(DomainEvent::JobCancelled {
            job_id,
            reason: body.reason,
            actor: Actor::Customer,
        });
        Ok(StatusCode::NO_CONTENT)
    }

    #[instrument(skip(state, identity))]
    pub async fn approve_provider(
        State(state): State<AppState>,
        Extension(identity): Extension<VerifiedIdentity>,
        Path(job_id): Path<Uuid>,
    ) -> ApiResult<impl IntoResponse> {
        require_role(&identity, "customer")?;
        let mut job = state.jobs.get(job_id).await?;
        if job.customer_id != identity.subject_id {
            return Err(ApiError(CoreError::Unauthorized {
                reason: "not the job's customer".into(),
            }));
        }
        let outcome = dispatch_domain_lifecycle::transition(&mut job, JobStatus::Scheduled, Actor::Customer, None)
            .map_err(ApiError)?;
        state.jobs.save_transition(&job).await?;
        state.event_bus.publish(outcome.event);
        Ok(StatusCode::NO_CONTENT)
    }

    #[instrument(skip(state, identity))]
    pub async fn reject_provider(
        State(state): State<AppState>,
        Extension(identity): Extension<VerifiedIdentity>,
        Path(job_id): Path<Uuid>,
        Json(body): Json<CancelRequest>,
    ) -> ApiResult<impl IntoResponse> {
        require_role(&identity, "customer")?;
        let mut job = state.jobs.get(job_id).await?;
        if job.customer_id != identity.subject_id {
            return Err(ApiError(CoreError::Unauthorized {
                reason: "not the job's customer".into(),
            }));
        }

        for assignment in state.assignments.list_for_job(job_id).await? {
            if assignment.status == AssignmentStatus::Accepted {
                state
                    .assignments
                    .set_status(assignment.id, AssignmentStatus::Declined, Some(body.reason.clone()))
                    .await?;
            }
        }

        let outcome = dispatch_domain_lifecycle::transition(&mut job, JobStatus::PendingMatch, Actor::Customer, None)
            .map_err(ApiError)?;
        state.jobs.save_transition(&job).await?;
        state.event_bus.publish(outcome.event);

        let task = state.tasks.get(job.task_id).await?;
        broadcast_matching_offers(&state, &job, task.required_level, Utc::now()).await?;
        Ok(StatusCode::NO_CONTENT)
    }

    #[instrument(skip(state, identity))]
    pub async fn list_active_jobs(
        State(state): State<AppState>,
        Extension(identity): Extension<VerifiedIdentity>,
    ) -> ApiResult<impl IntoResponse> {
        require_role(&identity, "customer")?;
        let jobs = state
            .jobs
            .list_active_for_customer(identity.subject_id, state.config.max_page_size)
            .await?;
        Ok(Json(jobs))
    }

    #[instrument(skip(state, identity))]
    pub async fn rate_job(
        State(state): State<AppState>,
        Extension(identity): Extension<VerifiedIdentity>,
        Path(job_id): Path<Uuid>,
        Json(body): Json<RateJobRequest>,
    ) -> ApiResult<impl IntoResponse> {
        require_role(&identity, "customer")?;
        let job = state.jobs.get(job_id).await?;
        if job.customer_id != identity.subject_id {
            return Err(ApiError(CoreError::Unauthorized {
                reason: "not the job's customer".into(),
            }));
        }
        if job.status != JobStatus::Completed {
            return Err(ApiError(CoreError::ValidationFailed {
                reason: "only a completed job can be rated".into(),
            }));
        }
        if !(1..=5).contains(&body.stars) {
            return Err(ApiError(CoreError::ValidationFailed {
                reason: "stars must be between 1 and 5".into(),
            }));
        }

        let rating = Rating {
            id: Uuid::new_v4(),
            job_id,
            stars: body.stars,
            feedback: body.feedback,
            created_at: Utc::now(),
        };
        state.ratings.insert(&rating).await?;

        // §4.J `bad_review`: 1-2 stars is a penalized infraction; 3+ is not.
        if rating.stars <= 2 {
            if let Some(assignment) = state
                .assignments
                .list_for_job(job_id)
                .await?
                .into_iter()
                .find(|a| a.status == AssignmentStatus::Accepted && a.completed_at.is_some())
            {
                apply_penalty(
                    &state,
                    assignment.provider_id,
                    Some(job_id),
                    dispatch_domain_models::PenaltyType::BadReview,
                    rating.feedback.clone(),
                    Utc::now(),
                )
                .await?;
            }
        }

        Ok((StatusCode::CREATED, Json(rating)))
    }
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct RateJobRequest {
    pub stars: u8,
    pub feedback: Option<String>,
}

/// Shared by `create_job`, `reject_provider`, and the offer-expiry sweeper:
/// assembles the matching candidate pool from every active provider, runs
/// the pipeline, and broadcasts offers for the winners.
pub(crate) async fn broadcast_matching_offers(
    state: &AppState,
    job: &Job,
    required_level: Level,
    now: chrono::DateTime<Utc>,
) -> ApiResult<Vec<Assignment>> {
    let mut inputs = Vec::new();
    let mut records_owned = Vec::new();

    for provider in state.providers.list_all().await? {
        if provider.status != ProviderStatus::Active && provider.status != ProviderStatus::Onboarding
            && provider.status != ProviderStatus::PendingReview
        {
            continue;
        }
        let task_qualified = state.providers.is_task_qualified(provider.id, job.task_id).await?;
        let credentials = state.providers.credentials_for(provider.id).await?;
        let insurance_policies = state.providers.insurance_for(provider.id).await?;
        let on_call_shifts = state.providers.on_call_shifts_for(provider.id).await?;
        records_owned.push((provider, task_qualified, credentials, insurance_policies, on_call_shifts));
    }

    for (profile, task_qualified, credentials, insurance_policies, on_call_shifts) in &records_owned {
        inputs.push(dispatch_domain_matching::CandidateInput {
            records: dispatch_domain_matching::CandidateRecords {
                profile,
                task_qualified: *task_qualified,
                credentials,
                insurance_policies: insurance_policies,
                on_call_shifts,
            },
            response_time_avg_min: None,
        });
    }

    let ranked = dispatch_domain_matching::find_matching_providers(
        inputs,
        job.customer_id,
        required_level,
        job.service_lat,
        job.service_lng,
        None,
        now.date_naive(),
        now,
        dispatch_domain_matching::DEFAULT_MAX_RESULTS,
    );

    if ranked.is_empty() {
        info!(job_id = %job.id, "no qualifying providers found");
        return Ok(Vec::new());
    }

    let assignments =
        dispatch_domain_dispatch::broadcast(job.id, ranked, job.sla_snapshot.response_time_min, now);
    for assignment in &assignments {
        state.assignments.insert(assignment).await?;
        // §4.I: broadcast notifies each offered provider's personal room in
        // real time via the `new_offer` event; polling `list_pending_offers`
        // is the fallback path for a client that missed it.
        state.event_bus.publish(DomainEvent::OfferCreated {
            job_id: assignment.job_id,
            provider_id: assignment.provider_id,
            assignment_id: assignment.id,
        });
    }

    let mut job_matched = job.clone();
    let outcome =
        dispatch_domain_lifecycle::transition(&mut job_matched, JobStatus::Matched, Actor::System, None)
            .map_err(ApiError)?;
    state.jobs.save_transition(&job_matched).await?;
    state.event_bus.publish(outcome.event);

    Ok(assignments)
}

// ---------------------------------------------------------------- Provider

pub struct ProviderOperations;

impl ProviderOperations {
    #[instrument(skip(state, identity))]
    pub async fn list_pending_offers(
        State(state): State<AppState>,
        Extension(identity): Extension<VerifiedIdentity>,
    ) -> ApiResult<impl IntoResponse> {
        require_role(&identity, "provider")?;
        let offers = state.assignments.list_offered_for_provider(identity.subject_id).await?;
        Ok(Json(offers))
    }

    #[instrument(skip(state, identity))]
    pub async fn accept_offer(
        State(state): State<AppState>,
        Extension(identity): Extension<VerifiedIdentity>,
        Path(job_id): Path<Uuid>,
    ) -> ApiResult<impl IntoResponse> {
        require_role(&identity, "provider")?;
        let provider_id = identity.subject_id;

        // compare_and_set_status only writes if the row is still `offered`; a
        // concurrent accept/decline/expiry can invalidate the in-memory plan
        // between the read and the write. §7 marks this retry-safe.
        for attempt in 1..=CONFLICT_RETRY_ATTEMPTS {
            let mut job = state.jobs.get(job_id).await?;
            let mut assignments = state.assignments.list_for_job(job_id).await?;
            let now = Utc::now();

            let outcome =
                dispatch_domain_dispatch::accept(&mut job, &mut assignments, provider_id, now).map_err(ApiError)?;

            let mut lost_race = false;
            for assignment in &assignments {
                let applied = state
                    .assignments
                    .compare_and_set_status(assignment.id, assignment.status, assignment.decline_reason.clone())
                    .await?;
                lost_race |= !applied;
            }
            if lost_race {
                if attempt == CONFLICT_RETRY_ATTEMPTS {
                    return Err(ApiError(CoreError::ConflictingState {
                        detail: format!("assignment state for job {job_id} changed concurrently"),
                    }));
                }
                continue;
            }

            if outcome.job_transitioned {
                state.jobs.save_transition(&job).await?;
            }
            state.event_bus.publish_all(outcome.events);
            return Ok(StatusCode::NO_CONTENT);
        }
        unreachable!("loop always returns or errors on its final attempt")
    }

    #[instrument(skip(state, identity))]
    pub async fn decline_offer(
        State(state): State<AppState>,
        Extension(identity): Extension<VerifiedIdentity>,
        Path(job_id): Path<Uuid>,
        Json(body): Json<DeclineRequest>,
    ) -> ApiResult<impl IntoResponse> {
        require_role(&identity, "provider")?;
        let provider_id = identity.subject_id;

        let all_terminal = {
            let mut result = None;
            for attempt in 1..=CONFLICT_RETRY_ATTEMPTS {
                let mut assignments = state.assignments.list_for_job(job_id).await?;
                let all_terminal = dispatch_domain_dispatch::decline(
                    &mut assignments,
                    provider_id,
                    job_id,
                    body.reason.clone(),
                    Utc::now(),
                )
                .map_err(ApiError)?;

                let mut lost_race = false;
                for assignment in &assignments {
                    if assignment.provider_id == provider_id {
                        let applied = state
                            .assignments
                            .compare_and_set_status(
                                assignment.id,
                                assignment.status,
                                assignment.decline_reason.clone(),
                            )
                            .await?;
                        lost_race |= !applied;
                    }
                }
                if lost_race {
                    if attempt == CONFLICT_RETRY_ATTEMPTS {
                        return Err(ApiError(CoreError::ConflictingState {
                            detail: format!("assignment state for job {job_id} changed concurrently"),
                        }));
                    }
                    continue;
                }
                result = Some(all_terminal);
                break;
            }
            result.expect("loop always sets result or returns on its final attempt")
        };

        if all_terminal {
            let mut job = state.jobs.get(job_id).await?;
            if dispatch_domain_lifecycle::transition(&mut job, JobStatus::PendingMatch, Actor::System, None).is_ok() {
                state.jobs.save_transition(&job).await?;
                let task = state.tasks.get(job.task_id).await?;
                broadcast_matching_offers(&state, &job, task.required_level, Utc::now()).await?;
            }
        }
        Ok(StatusCode::NO_CONTENT)
    }

    /// §4.G has no job-level "arrived" state — only `provider_en_route`. The
    /// milestones tracked past that point live on the assignment (§4.H:
    /// `en_route_at`, `arrived_at`, `sla_*_met`), not on the job FSM.
    async fn accepted_assignment(state: &AppState, job_id: Uuid, provider_id: Uuid) -> ApiResult<Assignment> {
        state
            .assignments
            .list_for_job(job_id)
            .await?
            .into_iter()
            .find(|a| a.provider_id == provider_id && a.status == AssignmentStatus::Accepted)
            .ok_or_else(|| ApiError(CoreError::OfferNotFound { job_id, provider_id }))
    }

    #[instrument(skip(state, identity))]
    pub async fn mark_en_route(
        State(state): State<AppState>,
        Extension(identity): Extension<VerifiedIdentity>,
        Path(job_id): Path<Uuid>,
        Json(body): Json<LocationRequest>,
    ) -> ApiResult<impl IntoResponse> {
        Self::transition(&state, &identity, job_id, JobStatus::ProviderEnRoute).await?;

        let assignment = Self::accepted_assignment(&state, job_id, identity.subject_id).await?;
        let now = Utc::now();
        let job = state.jobs.get(job_id).await?;
        let sla_completion_deadline = job
            .sla_snapshot
            .completion_time_min
            .map(|min| now + chrono::Duration::minutes(min as i64));
        state.assignments.record_en_route(assignment.id, now, sla_completion_deadline).await?;

        crate::services::location::record_location_update(
            &state,
            identity.subject_id,
            body.lat,
            body.lng,
            None,
            None,
            None,
        )
        .await
        .ok();
        Ok(StatusCode::NO_CONTENT)
    }

    #[instrument(skip(state, identity))]
    pub async fn mark_arrived(
        State(state): State<AppState>,
        Extension(identity): Extension<VerifiedIdentity>,
        Path(job_id): Path<Uuid>,
    ) -> ApiResult<impl IntoResponse> {
        require_role(&identity, "provider")?;
        let assignment = Self::accepted_assignment(&state, job_id, identity.subject_id).await?;
        let now = Utc::now();
        let met = assignment.sla_arrival_deadline.map(|deadline| now <= deadline);
        state.assignments.record_arrival(assignment.id, now, met).await?;
        Ok(StatusCode::NO_CONTENT)
    }

    #[instrument(skip(state, identity))]
    pub async fn mark_started(
        State(state): State<AppState>,
        Extension(identity): Extension<VerifiedIdentity>,
        Path(job_id): Path<Uuid>,
    ) -> ApiResult<impl IntoResponse> {
        Self::transition(&state, &identity, job_id, JobStatus::InProgress).await?;
        let assignment = Self::accepted_assignment(&state, job_id, identity.subject_id).await?;
        state.assignments.record_started(assignment.id, Utc::now()).await?;
        Ok(StatusCode::NO_CONTENT)
    }

    #[instrument(skip(state, identity))]
    pub async fn mark_completed(
        State(state): State<AppState>,
        Extension(identity): Extension<VerifiedIdentity>,
        Path(job_id): Path<Uuid>,
    ) -> ApiResult<impl IntoResponse> {
        Self::transition(&state, &identity, job_id, JobStatus::Completed).await?;
        let assignment = Self::accepted_assignment(&state, job_id, identity.subject_id).await?;
        let now = Utc::now();
        let met = assignment.sla_completion_deadline.map(|deadline| now <= deadline);
        state.assignments.record_completed(assignment.id, now, met).await?;
        if met == Some(false) {
            apply_penalty(
                &state,
                identity.subject_id,
                Some(job_id),
                dispatch_domain_models::PenaltyType::SlaBreach,
                Some("completion deadline missed".into()),
                now,
            )
            .await?;
        }
        publish_job_completed(&state, job_id);
        Ok(StatusCode::NO_CONTENT)
    }

    async fn transition(state: &AppState, identity: &VerifiedIdentity, job_id: Uuid, to: JobStatus) -> ApiResult<()> {
        require_role(identity, "provider")?;
        let mut job = state.jobs.get(job_id).await?;
        let outcome = dispatch_domain_lifecycle::transition(&mut job, to, Actor::Provider, None).map_err(ApiError)?;
        state.jobs.save_transition(&job).await?;
        state.event_bus.publish(outcome.event);
        Ok(())
    }

    #[instrument(skip(state, identity))]
    pub async fn update_location(
        State(state): State<AppState>,
        Extension(identity): Extension<VerifiedIdentity>,
        Json(body): Json<LocationRequest>,
    ) -> ApiResult<impl IntoResponse> {
        require_role(&identity, "provider")?;
        crate::services::location::record_location_update(
            &state,
            identity.subject_id,
            body.lat,
            body.lng,
            body.heading,
            body.speed,
            body.accuracy,
        )
        .await
        .map_err(|e| ApiError(CoreError::ValidationFailed { reason: e.to_string() }))?;
        Ok(StatusCode::NO_CONTENT)
    }

    #[instrument(skip(state, identity))]
    pub async fn set_online(
        State(state): State<AppState>,
        Extension(identity): Extension<VerifiedIdentity>,
        Json(body): Json<SetOnlineRequest>,
    ) -> ApiResult<impl IntoResponse> {
        require_role(&identity, "provider")?;
        state.providers.set_online(identity.subject_id, body.online).await?;
        Ok(StatusCode::NO_CONTENT)
    }

    #[instrument(skip(state, identity))]
    pub async fn upload_credential(
        State(state): State<AppState>,
        Extension(identity): Extension<VerifiedIdentity>,
        Json(body): Json<UploadCredentialRequest>,
    ) -> ApiResult<impl IntoResponse> {
        require_role(&identity, "provider")?;
        let credential = Credential {
            id: Uuid::new_v4(),
            provider_id: identity.subject_id,
            credential_type: body.credential_type,
            name: body.file_ref,
            status: CredentialStatus::PendingReview,
            issued_date: None,
            expiry_date: None,
            jurisdiction: None,
        };
        state.providers.insert_credential(&credential).await?;
        if let Some(task_id) = body.task_id {
            state.providers.request_task_qualification(identity.subject_id, task_id).await?;
        }
        Ok((StatusCode::CREATED, Json(credential)))
    }
}

#[derive(Debug, Deserialize)]
pub struct DeclineRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    pub lat: f64,
    pub lng: f64,
    pub heading: Option<f64>,
    pub speed: Option<f64>,
    pub accuracy: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct SetOnlineRequest {
    pub online: bool,
}

#[derive(Debug, Deserialize)]
pub struct UploadCredentialRequest {
    pub credential_type: CredentialType,
    pub file_ref: String,
    pub task_id: Option<Uuid>,
}

// ------------------------------------------------------------------ Admin

pub struct AdminOperations;

#[derive(Debug, Serialize)]
pub struct AdjustScoreResponse {
    pub new_score: f64,
    pub suspended: bool,
}

impl AdminOperations {
    #[instrument(skip(state, identity))]
    pub async fn approve_credential(
        State(state): State<AppState>,
        Extension(identity): Extension<VerifiedIdentity>,
        Path(credential_id): Path<Uuid>,
    ) -> ApiResult<impl IntoResponse> {
        require_role(&identity, "admin")?;
        state
            .providers
            .set_credential_status(credential_id, CredentialStatus::Verified)
            .await?;
        Ok(StatusCode::NO_CONTENT)
    }

    #[instrument(skip(state, identity))]
    pub async fn reject_credential(
        State(state): State<AppState>,
        Extension(identity): Extension<VerifiedIdentity>,
        Path(credential_id): Path<Uuid>,
        Json(body): Json<CancelRequest>,
    ) -> ApiResult<impl IntoResponse> {
        require_role(&identity, "admin")?;
        warn!(%credential_id, reason = %body.reason, "credential rejected");
        state
            .providers
            .set_credential_status(credential_id, CredentialStatus::Rejected)
            .await?;
        Ok(StatusCode::NO_CONTENT)
    }

    #[instrument(skip(state, identity))]
    pub async fn adjust_score(
        State(state): State<AppState>,
        Extension(identity): Extension<VerifiedIdentity>,
        Path(provider_id): Path<Uuid>,
        Json(body): Json<AdjustScoreRequest>,
    ) -> ApiResult<impl IntoResponse> {
        require_role(&identity, "admin")?;
        let provider = state.providers.get(provider_id).await?;
        let outcome = dispatch_domain_scoring::adjust(
            provider_id,
            provider.level,
            provider.internal_score,
            body.delta,
            body.reason,
            Utc::now(),
        );

        let status = if outcome.suspend { ProviderStatus::Suspended } else { provider.status };
        state.providers.update_score(provider_id, outcome.new_score, status).await?;
        state.penalties.insert(&outcome.record).await?;
        state.event_bus.publish(DomainEvent::PenaltyApplied {
            provider_id,
            points_deducted: outcome.record.points_deducted,
            new_score: outcome.new_score,
        });

        Ok(Json(AdjustScoreResponse {
            new_score: outcome.new_score,
            suspended: outcome.suspend,
        }))
    }

    #[instrument(skip(state, identity))]
    pub async fn reassign(
        State(state): State<AppState>,
        Extension(identity): Extension<VerifiedIdentity>,
        Path(job_id): Path<Uuid>,
        Json(body): Json<ReassignRequest>,
    ) -> ApiResult<impl IntoResponse> {
        require_role(&identity, "admin")?;
        let mut job = state.jobs.get(job_id).await?;
        let mut assignments = state.assignments.list_for_job(job_id).await?;
        let previous_provider_id = assignments
            .iter()
            .find(|a| a.status == AssignmentStatus::Accepted)
            .map(|a| a.provider_id);

        // §4.J `cancellation`: only the provider who had actually committed
        // (accepted) and is now being bumped is penalized — a merely
        // `offered` candidate never agreed to anything.
        if let Some(provider_id) = previous_provider_id {
            apply_penalty(
                &state,
                provider_id,
                Some(job_id),
                dispatch_domain_models::PenaltyType::Cancellation,
                Some(body.reason.clone()),
                Utc::now(),
            )
            .await?;
        }

        dispatch_domain_dispatch::reassign_cancel_current(&mut assignments, &body.reason, Utc::now());
        for assignment in &assignments {
            if assignment.status == AssignmentStatus::Cancelled {
                state
                    .assignments
                    .set_status(assignment.id, AssignmentStatus::Cancelled, Some(body.reason.clone()))
                    .await?;
            }
        }

        // §4.I: reassign only resets the job to pending_match when it was
        // matched or provider_accepted; any other originating state (e.g.
        // pending_approval, scheduled) keeps its status while the new offer
        // goes out.
        if matches!(job.status, JobStatus::Matched | JobStatus::ProviderAccepted) {
            let outcome =
                dispatch_domain_lifecycle::transition(&mut job, JobStatus::PendingMatch, Actor::System, None)
                    .map_err(ApiError)?;
            state.jobs.save_transition(&job).await?;
            state.event_bus.publish(outcome.event);
        }

        let new_offer = Assignment {
            id: Uuid::new_v4(),
            job_id,
            provider_id: body.new_provider_id,
            status: AssignmentStatus::Offered,
            offered_at: Utc::now(),
            offer_expires_at: Utc::now() + chrono::Duration::minutes(dispatch_domain_dispatch::DEFAULT_RESPONSE_MIN as i64),
            responded_at: None,
            decline_reason: None,
            sla_response_deadline: Utc::now() + chrono::Duration::minutes(dispatch_domain_dispatch::DEFAULT_RESPONSE_MIN as i64),
            sla_arrival_deadline: None,
            sla_completion_deadline: None,
            sla_response_met: None,
            sla_arrival_met: None,
            sla_completion_met: None,
            en_route_at: None,
            arrived_at: None,
            started_work_at: None,
            completed_at: None,
            match_score: 0.0,
        };
        state.assignments.insert(&new_offer).await?;
        state.event_bus.publish(DomainEvent::OfferCreated {
            job_id,
            provider_id: new_offer.provider_id,
            assignment_id: new_offer.id,
        });

        state.event_bus.publish(DomainEvent::ProviderReassigned {
            job_id,
            previous_provider_id,
            new_provider_id: body.new_provider_id,
            reason: body.reason,
        });
        Ok(StatusCode::NO_CONTENT)
    }
}

#[derive(Debug, Deserialize)]
pub struct AdjustScoreRequest {
    pub delta: f64,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct ReassignRequest {
    pub new_provider_id: Uuid,
    pub reason: String,
}
