//! Route topology: the narrow actor-authenticated service-operation
//! surface (spec §6), the real-time socket, and the liveness/auth guards
//! layered over all of it.

use std::time::Duration;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::{middleware, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::handlers::operations::{AdminOperations, CustomerOperations, ProviderOperations};
use crate::handlers::stream;
use crate::middleware::{auth_guard, health_guard};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            state
                .config
                .cors_allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok()),
        ))
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    let customer_routes = Router::new()
        .route("/jobs", post(CustomerOperations::create_job))
        .route("/jobs/active", get(CustomerOperations::list_active_jobs))
        .route("/jobs/:job_id/cancel", post(CustomerOperations::cancel_job))
        .route("/jobs/:job_id/approve-provider", post(CustomerOperations::approve_provider))
        .route("/jobs/:job_id/reject-provider", post(CustomerOperations::reject_provider))
        .route("/jobs/:job_id/rating", post(CustomerOperations::rate_job));

    let provider_routes = Router::new()
        .route("/offers", get(ProviderOperations::list_pending_offers))
        .route("/jobs/:job_id/accept", post(ProviderOperations::accept_offer))
        .route("/jobs/:job_id/decline", post(ProviderOperations::decline_offer))
        .route("/jobs/:job_id/en-route", post(ProviderOperations::mark_en_route))
        .route("/jobs/:job_id/arrived", post(ProviderOperations::mark_arrived))
        .route("/jobs/:job_id/start", post(ProviderOperations::mark_started))
        .route("/jobs/:job_id/complete", post(ProviderOperations::mark_completed))
        .route("/location", post(ProviderOperations::update_location))
        .route("/online", post(ProviderOperations::set_online))
        .route("/credentials", post(ProviderOperations::upload_credential));

    let admin_routes = Router::new()
        .route("/credentials/:credential_id/approve", post(AdminOperations::approve_credential))
        .route("/credentials/:credential_id/reject", post(AdminOperations::reject_credential))
        .route("/providers/:provider_id/score", post(AdminOperations::adjust_score))
        .route("/jobs/:job_id/reassign", post(AdminOperations::reassign));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .nest(
            "/api/v1",
            Router::new()
                .nest("/customer", customer_routes)
                .nest("/provider", provider_routes)
                .nest("/admin", admin_routes)
                .route("/stream", get(stream::upgrade))
                .layer(middleware::from_fn_with_state(state.clone(), health_guard))
                .layer(middleware::from_fn_with_state(state.clone(), auth_guard)),
        )
        .layer(cors)
        .with_state(state)
}
